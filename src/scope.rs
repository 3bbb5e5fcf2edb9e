//! Binding lookups on top of the resolver's output.
//!
//! After `resolver` runs, `(sym, ctxt)` names exactly one binding, so counting
//! and ordering identifiers by [`Id`] is scope-correct without walking scopes
//! ourselves.

use std::collections::{HashMap, HashSet};

use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitWith},
};

use crate::passes::PassContext;

/// Identifier occurrences per binding, collected in one walk.
#[derive(Debug, Default)]
pub(crate) struct BindingIndex {
    occurrences: HashMap<Id, usize>,
    first_seen: Vec<Id>,
    names: HashSet<String>,
    jsx_elements: HashSet<Id>,
    dynamic_scope: bool,
}

impl BindingIndex {
    pub fn collect(program: &Program, ctx: &PassContext) -> Self {
        let mut collector = Collector {
            index: BindingIndex::default(),
            ctx,
        };
        program.visit_with(&mut collector);
        collector.index
    }

    /// How often the binding is spelled, declarations included.
    pub fn occurrences(&self, id: &Id) -> usize {
        self.occurrences.get(id).copied().unwrap_or(0)
    }

    /// Every binding (and unresolved global) in order of first appearance.
    pub fn in_order(&self) -> impl Iterator<Item = &Id> {
        self.first_seen.iter()
    }

    /// Is `name` spelled as an identifier anywhere in the program?
    pub fn is_name_taken(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_jsx_element(&self, id: &Id) -> bool {
        self.jsx_elements.contains(id)
    }

    /// The program contains a direct `eval(...)` or a `with` statement.
    pub fn has_dynamic_scope(&self) -> bool {
        self.dynamic_scope
    }
}

struct Collector<'a> {
    index: BindingIndex,
    ctx: &'a PassContext,
}

impl Visit for Collector<'_> {
    fn visit_ident(&mut self, i: &Ident) {
        let id = i.to_id();
        let count = self.index.occurrences.entry(id.clone()).or_insert(0);
        if *count == 0 {
            self.index.first_seen.push(id);
            self.index.names.insert(i.sym.to_string());
        }
        *count += 1;
    }

    fn visit_jsx_element_name(&mut self, n: &JSXElementName) {
        if let JSXElementName::Ident(i) = n {
            self.index.jsx_elements.insert(i.to_id());
        }
        n.visit_children_with(self);
    }

    fn visit_with_stmt(&mut self, n: &WithStmt) {
        self.index.dynamic_scope = true;
        n.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        if let Callee::Expr(callee) = &n.callee {
            if let Expr::Ident(i) = &**callee {
                if i.sym.as_ref() == "eval" && self.ctx.is_unresolved(i.ctxt) {
                    self.index.dynamic_scope = true;
                }
            }
        }
        n.visit_children_with(self);
    }
}
