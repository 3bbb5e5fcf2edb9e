//! Parsing, scope resolution and code generation, all delegated to swc.

use swc_core::{
    common::{
        comments::{Comments, SingleThreadedComments},
        sync::Lrc,
        FileName, Mark, SourceMap, Spanned,
    },
    ecma::{
        ast::{EsVersion, Program},
        codegen::{text_writer::JsWriter, Config, Emitter, Node},
        parser::{parse_file_as_program, EsSyntax, Syntax},
        transforms::base::{fixer::fixer, resolver},
    },
};

use crate::error::{Error, Result};

/// A parsed program with scope information applied.
pub(crate) struct Parsed {
    pub program: Program,
    pub unresolved_mark: Mark,
    pub top_level_mark: Mark,
}

/// Syntax toggles. swc always understands class properties and optional
/// chaining, so JSX is the only one that needs switching on.
fn syntax() -> Syntax {
    Syntax::Es(EsSyntax {
        jsx: true,
        ..Default::default()
    })
}

/// Parse `source` (script or module, detected from its contents) and run the
/// resolver so every identifier carries the `SyntaxContext` of its binding.
///
/// Must run inside `GLOBALS.set`.
pub(crate) fn parse(
    cm: &Lrc<SourceMap>,
    comments: &SingleThreadedComments,
    source: &str,
) -> Result<Parsed> {
    let fm = cm.new_source_file(
        FileName::Custom("input.js".into()).into(),
        source.to_string().into(),
    );

    let mut recovered = vec![];
    let parsed = parse_file_as_program(
        &fm,
        syntax(),
        EsVersion::latest(),
        Some(comments as &dyn Comments),
        &mut recovered,
    );
    let mut program = match parsed {
        Ok(program) => match recovered.into_iter().next() {
            Some(err) => return Err(parse_error(cm, err)),
            None => program,
        },
        Err(err) => return Err(parse_error(cm, err)),
    };

    let unresolved_mark = Mark::new();
    let top_level_mark = Mark::new();
    program.mutate(resolver(unresolved_mark, top_level_mark, false));

    Ok(Parsed {
        program,
        unresolved_mark,
        top_level_mark,
    })
}

fn parse_error(cm: &Lrc<SourceMap>, err: swc_core::ecma::parser::error::Error) -> Error {
    let loc = cm.lookup_char_pos(err.span().lo);
    Error::Parse {
        message: err.kind().msg().to_string(),
        line: loc.line,
        column: loc.col_display + 1,
    }
}

/// Print `program` back to text, keeping the comments collected while parsing.
pub(crate) fn emit(
    cm: &Lrc<SourceMap>,
    comments: &SingleThreadedComments,
    mut program: Program,
) -> Result<String> {
    // Rewrites can leave operands that need (or no longer need) parentheses.
    program.mutate(fixer(Some(comments as &dyn Comments)));

    let mut buf = vec![];
    {
        let mut emitter = Emitter {
            cfg: Config::default().with_target(EsVersion::latest()),
            cm: cm.clone(),
            comments: Some(comments as &dyn Comments),
            wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
        };
        program.emit_with(&mut emitter)?;
    }
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_core::common::{Globals, GLOBALS};

    fn round_trip(source: &str) -> Result<String> {
        GLOBALS.set(&Globals::new(), || {
            let cm: Lrc<SourceMap> = Default::default();
            let comments = SingleThreadedComments::default();
            let parsed = parse(&cm, &comments, source)?;
            emit(&cm, &comments, parsed.program)
        })
    }

    #[test]
    fn keeps_comments() {
        let out = round_trip("// keep me\nfoo(1);\n").unwrap();
        assert!(out.contains("// keep me"));
        assert!(out.contains("foo(1);"));
    }

    #[test]
    fn accepts_jsx_and_modern_syntax() {
        let out = round_trip("class A { x = 1; }\nconst el = <div>{a?.b}</div>;\n").unwrap();
        assert!(out.contains("<div>"));
        assert!(out.contains("a?.b"));
    }

    #[test]
    fn reports_position_of_syntax_errors() {
        match round_trip("var = ;") {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
