use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use swc_core::{
    common::DUMMY_SP,
    ecma::{
        ast::*,
        visit::{VisitMut, VisitMutWith},
    },
};

use super::{Pass, PassContext};
use crate::{error::PassError, report::{PassStats, STRINGS_DECODED}};

/// Decodes escaped string literals and literal base64 payloads.
pub struct LiteralDecoder;

impl Pass for LiteralDecoder {
    fn run(&mut self, program: &mut Program, ctx: &PassContext) -> Result<PassStats, PassError> {
        let mut escapes = EscapeDecoder { decoded: 0 };
        program.visit_mut_with(&mut escapes);

        let mut atob = Base64CallDecoder {
            rule: CallRule::Atob,
            ctx,
            decoded: 0,
        };
        program.visit_mut_with(&mut atob);

        let mut from = Base64CallDecoder {
            rule: CallRule::IdentFrom,
            ctx,
            decoded: 0,
        };
        program.visit_mut_with(&mut from);

        Ok(PassStats::new().with_counter(
            STRINGS_DECODED,
            escapes.decoded + atob.decoded + from.decoded,
        ))
    }
}

fn str_lit(value: String) -> Expr {
    Expr::Lit(Lit::Str(Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }))
}

// -----------------------------------------------------------------------------
// Escapes
// -----------------------------------------------------------------------------

/// Decode the body of a quoted string literal.
///
/// Returns the decoded text and whether a `\x` or `\u` escape was seen, or
/// `None` for anything outside the supported escape set.
fn decode_escapes(body: &str) -> Option<(String, bool)> {
    let mut out = String::with_capacity(body.len());
    let mut saw_hex = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'x' => {
                let unit = hex_digits(&mut chars, 2)?;
                out.push(char::from_u32(unit)?);
                saw_hex = true;
            }
            'u' => {
                let unit = hex_digits(&mut chars, 4)?;
                let c = match unit {
                    0xD800..=0xDBFF => {
                        // A high surrogate must be followed by an escaped low one.
                        if chars.next()? != '\\' || chars.next()? != 'u' {
                            return None;
                        }
                        let low = hex_digits(&mut chars, 4)?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return None;
                        }
                        char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))?
                    }
                    0xDC00..=0xDFFF => return None,
                    _ => char::from_u32(unit)?,
                };
                out.push(c);
                saw_hex = true;
            }
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !chars.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            // Legacy octal and `\8`/`\9`.
            '0'..='9' => return None,
            // Line continuations.
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }

    Some((out, saw_hex))
}

/// Read exactly `n` hex digits. `\u{...}` fails here on the brace.
fn hex_digits(chars: &mut impl Iterator<Item = char>, n: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..n {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

/// Characters the code generator escapes again when printing.
fn is_printable(c: char) -> bool {
    !(c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}'))
}

struct EscapeDecoder {
    decoded: u64,
}

impl EscapeDecoder {
    fn decode(&mut self, s: &mut Str) {
        let Some(raw) = &s.raw else {
            return;
        };
        if raw.len() < 2 {
            return;
        }
        let body = &raw[1..raw.len() - 1];
        let Some((decoded, saw_hex)) = decode_escapes(body) else {
            return;
        };
        // Only the spelling changes; the value must stay the parsed one.
        if !saw_hex || decoded != *s.value || decoded == body {
            return;
        }
        if !decoded.chars().all(is_printable) {
            return;
        }
        s.raw = None;
        self.decoded += 1;
    }
}

impl VisitMut for EscapeDecoder {
    fn visit_mut_str(&mut self, s: &mut Str) {
        self.decode(s);
    }

    // Escapes are not processed inside JSX attribute strings.
    fn visit_mut_jsx_attr_value(&mut self, v: &mut JSXAttrValue) {
        if !matches!(v, JSXAttrValue::Lit(_)) {
            v.visit_mut_children_with(self);
        }
    }

    // An escaped directive is not a directive; decoding it would make it one.
    fn visit_mut_expr_stmt(&mut self, s: &mut ExprStmt) {
        if !matches!(&*s.expr, Expr::Lit(Lit::Str(_))) {
            s.visit_mut_children_with(self);
        }
    }
}

// -----------------------------------------------------------------------------
// Base64
// -----------------------------------------------------------------------------

/// Standard alphabet, padding optional.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// URL-safe alphabet, padding optional.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

fn decode_base64(payload: &str, engines: &[&GeneralPurpose]) -> Option<String> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = engines
        .iter()
        .find_map(|engine| engine.decode(compact.as_bytes()).ok())?;
    String::from_utf8(bytes).ok()
}

#[derive(Debug, Clone, Copy)]
enum CallRule {
    /// `atob("...")` on the host's `atob`.
    Atob,
    /// `<ident>.from("...", "base64")`.
    IdentFrom,
}

impl CallRule {
    /// Alphabets to try, in order.
    fn engines(self) -> &'static [&'static GeneralPurpose] {
        match self {
            CallRule::Atob => &[&STANDARD_LENIENT],
            CallRule::IdentFrom => &[&STANDARD_LENIENT, &URL_SAFE_LENIENT],
        }
    }
}

fn str_arg(arg: &ExprOrSpread) -> Option<&str> {
    match arg {
        ExprOrSpread { spread: None, expr } => match &**expr {
            Expr::Lit(Lit::Str(s)) => Some(&s.value),
            _ => None,
        },
        _ => None,
    }
}

struct Base64CallDecoder<'a> {
    rule: CallRule,
    ctx: &'a PassContext,
    decoded: u64,
}

impl Base64CallDecoder<'_> {
    fn payload<'c>(&self, call: &'c CallExpr) -> Option<&'c str> {
        let Callee::Expr(callee) = &call.callee else {
            return None;
        };
        match self.rule {
            CallRule::Atob => {
                let Expr::Ident(name) = &**callee else {
                    return None;
                };
                if &*name.sym != "atob" || !self.ctx.is_unresolved(name.ctxt) {
                    return None;
                }
                match call.args.as_slice() {
                    [payload] => str_arg(payload),
                    _ => None,
                }
            }
            CallRule::IdentFrom => {
                let Expr::Member(MemberExpr {
                    obj,
                    prop: MemberProp::Ident(prop),
                    ..
                }) = &**callee
                else {
                    return None;
                };
                if !matches!(&**obj, Expr::Ident(_)) || &*prop.sym != "from" {
                    return None;
                }
                match call.args.as_slice() {
                    [payload, encoding]
                        if str_arg(encoding)?.eq_ignore_ascii_case("base64") =>
                    {
                        str_arg(payload)
                    }
                    _ => None,
                }
            }
        }
    }
}

impl VisitMut for Base64CallDecoder<'_> {
    fn visit_mut_expr(&mut self, e: &mut Expr) {
        e.visit_mut_children_with(self);

        let Expr::Call(call) = &*e else {
            return;
        };
        let Some(payload) = self.payload(call) else {
            return;
        };
        // Malformed payloads are left alone without a trace.
        if let Some(text) = decode_base64(payload, self.rule.engines()) {
            *e = str_lit(text);
            self.decoded += 1;
        }
    }
}
