use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use swc_core::ecma::{
    ast::*,
    visit::{VisitMut, VisitMutWith},
};

use super::{Pass, PassContext};
use crate::{
    error::{PassError, RenameError},
    report::{PassStats, IDENTIFIERS_RENAMED},
    scope::BindingIndex,
};

/// Names obfuscators generate: `_0x1f2e`, `0xab`, `a_12`.
static OBFUSCATED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_?0x[0-9a-fA-F]+$|^_0x|^[a-zA-Z]_\d+$").unwrap());

/// Host globals that are never renamed, even when shadowed locally.
const RESERVED: [&str; 10] = [
    "undefined",
    "NaN",
    "Infinity",
    "console",
    "window",
    "global",
    "require",
    "module",
    "exports",
    "process",
];

fn looks_obfuscated(name: &str) -> bool {
    !RESERVED.contains(&name) && OBFUSCATED_NAME.is_match(name)
}

/// Renames obfuscated-looking local bindings to `var_1`, `var_2`, ...
///
/// Program-level bindings and unresolved globals are never touched. The
/// counter runs across the whole program, so every renamed binding gets a
/// distinct name, and names already spelled somewhere in the source are
/// skipped.
pub struct IdentifierRenamer;

impl Pass for IdentifierRenamer {
    fn run(&mut self, program: &mut Program, ctx: &PassContext) -> Result<PassStats, PassError> {
        let index = BindingIndex::collect(program, ctx);
        let mut stats = PassStats::new();
        let mut names = NameAllocator::new(&index);
        let mut renames: HashMap<Id, String> = HashMap::new();

        for id in index.in_order() {
            if !ctx.is_local(id) || !looks_obfuscated(&id.0) {
                continue;
            }
            match check_renamable(&index, id) {
                Ok(()) => {
                    renames.insert(id.clone(), names.next_name());
                }
                Err(err) => {
                    if ctx.verbose {
                        log::info!("rename failed: {err}");
                    }
                    stats.note(format!("rename-failed={err}"));
                }
            }
        }

        if !renames.is_empty() {
            program.visit_mut_with(&mut Renamer { renames: &renames });
        }
        stats.add(IDENTIFIERS_RENAMED, renames.len() as u64);
        Ok(stats)
    }
}

fn check_renamable(index: &BindingIndex, id: &Id) -> Result<(), RenameError> {
    let name = id.0.to_string();
    if index.has_dynamic_scope() {
        return Err(RenameError::DynamicScope { name });
    }
    if index.is_jsx_element(id) {
        return Err(RenameError::JsxElement { name });
    }
    Ok(())
}

/// Hands out `var_N` names that appear nowhere in the program.
struct NameAllocator<'a> {
    index: &'a BindingIndex,
    next: usize,
}

impl<'a> NameAllocator<'a> {
    fn new(index: &'a BindingIndex) -> Self {
        Self { index, next: 1 }
    }

    fn next_name(&mut self) -> String {
        loop {
            let candidate = format!("var_{}", self.next);
            self.next += 1;
            if !self.index.is_name_taken(&candidate) {
                return candidate;
            }
        }
    }
}

struct Renamer<'a> {
    renames: &'a HashMap<Id, String>,
}

impl Renamer<'_> {
    fn renamed(&self, ident: &Ident) -> Option<Ident> {
        let name = self.renames.get(&ident.to_id())?;
        Some(Ident {
            sym: name.as_str().into(),
            ..ident.clone()
        })
    }
}

impl VisitMut for Renamer<'_> {
    fn visit_mut_ident(&mut self, i: &mut Ident) {
        if let Some(name) = self.renames.get(&i.to_id()) {
            i.sym = name.as_str().into();
        }
    }

    // `{ _0x1 }` must keep its key: `{ _0x1: var_1 }`.
    fn visit_mut_prop(&mut self, p: &mut Prop) {
        if let Prop::Shorthand(i) = p {
            if let Some(value) = self.renamed(i) {
                *p = Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(i.clone().into()),
                    value: Box::new(Expr::Ident(value)),
                });
                return;
            }
        }
        p.visit_mut_children_with(self);
    }

    // Same for `const { _0x1 = d } = o`.
    fn visit_mut_object_pat_prop(&mut self, p: &mut ObjectPatProp) {
        if let ObjectPatProp::Assign(AssignPatProp { span, key, value }) = p {
            if let Some(renamed) = self.renamed(&key.id) {
                let binding = Pat::Ident(BindingIdent {
                    id: renamed,
                    type_ann: None,
                });
                let value = match value.take() {
                    Some(mut default) => {
                        default.visit_mut_with(self);
                        Pat::Assign(AssignPat {
                            span: *span,
                            left: Box::new(binding),
                            right: default,
                        })
                    }
                    None => binding,
                };
                *p = ObjectPatProp::KeyValue(KeyValuePatProp {
                    key: PropName::Ident(key.id.clone().into()),
                    value: Box::new(value),
                });
                return;
            }
        }
        p.visit_mut_children_with(self);
    }
}
