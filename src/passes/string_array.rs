use std::collections::{HashMap, HashSet};

use swc_core::{
    common::DUMMY_SP,
    ecma::{
        ast::*,
        utils::find_pat_ids,
        visit::{Visit, VisitMut, VisitMutWith, VisitWith},
    },
};

use super::{Pass, PassContext};
use crate::{
    error::PassError,
    report::{PassStats, REMOVED_ARRAYS, STRINGS_DECODED},
    scope::BindingIndex,
};

/// Inlines `arr[i]` reads of `var arr = ["a", "b", ...]` and drops the array
/// once nothing refers to it anymore.
pub struct StringArrayResolver;

impl Pass for StringArrayResolver {
    fn run(&mut self, program: &mut Program, ctx: &PassContext) -> Result<PassStats, PassError> {
        // Scan
        let mut scanner = CandidateScanner::default();
        program.visit_with(&mut scanner);
        let candidates = scanner.into_candidates();
        if candidates.is_empty() {
            return Ok(PassStats::new()
                .with_counter(STRINGS_DECODED, 0)
                .with_counter(REMOVED_ARRAYS, 0));
        }
        if ctx.verbose {
            for (id, values) in &candidates {
                log::info!("found string array `{}` ({} entries)", id.0, values.len());
            }
        }

        // Rewrite
        let mut rewriter = IndexRewriter {
            candidates: &candidates,
            inlined: 0,
        };
        program.visit_mut_with(&mut rewriter);

        // Cleanup: the declaration itself is the only occurrence left.
        let index = BindingIndex::collect(program, ctx);
        let doomed: HashSet<Id> = candidates
            .keys()
            .filter(|id| index.occurrences(id) == 1)
            .cloned()
            .collect();
        let mut remover = DeclarationRemover {
            doomed: &doomed,
            removed: HashSet::new(),
        };
        program.visit_mut_with(&mut remover);

        if let Some(missing) = doomed.iter().find(|id| !remover.removed.contains(*id)) {
            return Err(PassError::MissingDeclaration {
                name: missing.0.to_string(),
            });
        }

        Ok(PassStats::new()
            .with_counter(STRINGS_DECODED, rewriter.inlined)
            .with_counter(REMOVED_ARRAYS, remover.removed.len() as u64))
    }
}

// -----------------------------------------------------------------------------
// Scan
// -----------------------------------------------------------------------------

#[derive(Default)]
struct CandidateScanner {
    arrays: HashMap<Id, Vec<String>>,
    declarations: HashMap<Id, usize>,
    exported: HashSet<Id>,
    /// Written to, deleted from or called through.
    mutated: HashSet<Id>,
    /// Every appearance of each identifier, declarations included.
    references: HashMap<Id, usize>,
    /// Appearances as `id[...]`.
    index_reads: HashMap<Id, usize>,
}

impl CandidateScanner {
    fn declare(&mut self, ids: Vec<Id>) {
        for id in ids {
            *self.declarations.entry(id).or_insert(0) += 1;
        }
    }

    fn mark_object(&mut self, e: &Expr) {
        if let Expr::Member(MemberExpr { obj, .. }) = e {
            if let Expr::Ident(obj) = &**obj {
                self.mutated.insert(obj.to_id());
            }
        }
    }

    /// Arrays declared exactly once, never exported, never mutated, and only
    /// ever read through `arr[...]`.
    fn into_candidates(self) -> HashMap<Id, Vec<String>> {
        let Self {
            arrays,
            declarations,
            exported,
            mutated,
            references,
            index_reads,
        } = self;
        arrays
            .into_iter()
            .filter(|(id, _)| {
                let reads = index_reads.get(id).copied().unwrap_or(0);
                declarations.get(id).copied() == Some(1)
                    && !exported.contains(id)
                    && !mutated.contains(id)
                    && references.get(id).copied() == Some(1 + reads)
            })
            .collect()
    }
}

/// The elements of a non-empty array made only of string literals.
fn string_elements(arr: &ArrayLit) -> Option<Vec<String>> {
    if arr.elems.is_empty() {
        return None;
    }
    arr.elems
        .iter()
        .map(|elem| match elem {
            Some(ExprOrSpread { spread: None, expr }) => match &**expr {
                Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

impl Visit for CandidateScanner {
    fn visit_var_declarator(&mut self, d: &VarDeclarator) {
        self.declare(find_pat_ids(&d.name));
        if let (Pat::Ident(name), Some(init)) = (&d.name, &d.init) {
            if let Expr::Array(arr) = &**init {
                if let Some(values) = string_elements(arr) {
                    self.arrays.insert(name.id.to_id(), values);
                }
            }
        }
        d.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.declare(vec![n.ident.to_id()]);
        n.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.declare(vec![n.ident.to_id()]);
        n.visit_children_with(self);
    }

    fn visit_param(&mut self, n: &Param) {
        self.declare(find_pat_ids(&n.pat));
        n.visit_children_with(self);
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        for p in &n.params {
            self.declare(find_pat_ids(p));
        }
        n.visit_children_with(self);
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        if let Some(param) = &n.param {
            self.declare(find_pat_ids(param));
        }
        n.visit_children_with(self);
    }

    fn visit_export_decl(&mut self, n: &ExportDecl) {
        if let Decl::Var(v) = &n.decl {
            for d in &v.decls {
                self.exported.extend(find_pat_ids::<_, Id>(&d.name));
            }
        }
        n.visit_children_with(self);
    }

    fn visit_ident(&mut self, i: &Ident) {
        *self.references.entry(i.to_id()).or_insert(0) += 1;
    }

    fn visit_member_expr(&mut self, n: &MemberExpr) {
        if let (Expr::Ident(obj), MemberProp::Computed(_)) = (&*n.obj, &n.prop) {
            *self.index_reads.entry(obj.to_id()).or_insert(0) += 1;
        }
        n.visit_children_with(self);
    }

    fn visit_assign_expr(&mut self, n: &AssignExpr) {
        if let AssignTarget::Simple(SimpleAssignTarget::Member(m)) = &n.left {
            if let Expr::Ident(obj) = &*m.obj {
                self.mutated.insert(obj.to_id());
            }
        }
        n.visit_children_with(self);
    }

    // `[a[0]] = x` and `for (a[0] in o)`.
    fn visit_pat(&mut self, p: &Pat) {
        if let Pat::Expr(e) = p {
            self.mark_object(e);
        }
        p.visit_children_with(self);
    }

    fn visit_update_expr(&mut self, n: &UpdateExpr) {
        self.mark_object(&n.arg);
        n.visit_children_with(self);
    }

    fn visit_unary_expr(&mut self, n: &UnaryExpr) {
        if n.op == UnaryOp::Delete {
            self.mark_object(&n.arg);
        }
        n.visit_children_with(self);
    }

    // `a["push"](..)` runs with the array as `this`.
    fn visit_call_expr(&mut self, n: &CallExpr) {
        if let Callee::Expr(callee) = &n.callee {
            self.mark_object(callee);
        }
        n.visit_children_with(self);
    }

    fn visit_new_expr(&mut self, n: &NewExpr) {
        self.mark_object(&n.callee);
        n.visit_children_with(self);
    }

    fn visit_tagged_tpl(&mut self, n: &TaggedTpl) {
        self.mark_object(&n.tag);
        n.visit_children_with(self);
    }

    fn visit_opt_chain_expr(&mut self, n: &OptChainExpr) {
        match &*n.base {
            OptChainBase::Member(m) => {
                if let Expr::Ident(obj) = &*m.obj {
                    self.mutated.insert(obj.to_id());
                }
            }
            OptChainBase::Call(c) => self.mark_object(&c.callee),
        }
        n.visit_children_with(self);
    }
}

// -----------------------------------------------------------------------------
// Rewrite
// -----------------------------------------------------------------------------

struct IndexRewriter<'a> {
    candidates: &'a HashMap<Id, Vec<String>>,
    inlined: u64,
}

/// A statically known, non-negative array index.
///
/// Accepts `3`, `"3"` and `"0x3"`. `-3` is a unary minus and always out of
/// bounds.
fn static_index(prop: &Expr) -> Option<usize> {
    match prop {
        Expr::Lit(Lit::Num(n)) => {
            let v = n.value;
            if v >= 0.0 && v.fract() == 0.0 && v < usize::MAX as f64 {
                Some(v as usize)
            } else {
                None
            }
        }
        Expr::Lit(Lit::Str(s)) => {
            let text: &str = &s.value;
            if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return usize::from_str_radix(hex, 16).ok();
                }
                return None;
            }
            if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
                return text.parse().ok();
            }
            None
        }
        _ => None,
    }
}

impl IndexRewriter<'_> {
    fn lookup(&self, expr: &Expr) -> Option<String> {
        let Expr::Member(MemberExpr {
            obj,
            prop: MemberProp::Computed(ComputedPropName { expr: index, .. }),
            ..
        }) = expr
        else {
            return None;
        };
        let Expr::Ident(obj) = &**obj else {
            return None;
        };
        let values = self.candidates.get(&obj.to_id())?;
        values.get(static_index(index)?).cloned()
    }
}

impl VisitMut for IndexRewriter<'_> {
    // Candidates are never written to, so every match is a read.
    fn visit_mut_expr(&mut self, e: &mut Expr) {
        if let Some(value) = self.lookup(e) {
            *e = Expr::Lit(Lit::Str(Str {
                span: DUMMY_SP,
                value: value.into(),
                raw: None,
            }));
            self.inlined += 1;
            return;
        }
        e.visit_mut_children_with(self);
    }
}

// -----------------------------------------------------------------------------
// Cleanup
// -----------------------------------------------------------------------------

struct DeclarationRemover<'a> {
    doomed: &'a HashSet<Id>,
    removed: HashSet<Id>,
}

fn is_emptied(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Decl(Decl::Var(v)) if v.decls.is_empty())
}

impl VisitMut for DeclarationRemover<'_> {
    fn visit_mut_var_decl(&mut self, v: &mut VarDecl) {
        v.decls.retain(|d| match &d.name {
            Pat::Ident(name) if self.doomed.contains(&name.id.to_id()) => {
                self.removed.insert(name.id.to_id());
                false
            }
            _ => true,
        });
        v.visit_mut_children_with(self);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        for stmt in stmts.iter_mut() {
            stmt.visit_mut_children_with(self);
        }
        stmts.retain(|s| !is_emptied(s));
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        for item in items.iter_mut() {
            match item {
                ModuleItem::Stmt(stmt) => stmt.visit_mut_children_with(self),
                other => other.visit_mut_with(self),
            }
        }
        items.retain(|item| !matches!(item, ModuleItem::Stmt(s) if is_emptied(s)));
    }

    // Single-statement positions such as `if (x) var a = [...]`.
    fn visit_mut_stmt(&mut self, s: &mut Stmt) {
        s.visit_mut_children_with(self);
        if is_emptied(s) {
            *s = Stmt::Empty(EmptyStmt { span: DUMMY_SP });
        }
    }

    fn visit_mut_for_stmt(&mut self, n: &mut ForStmt) {
        n.visit_mut_children_with(self);
        if matches!(&n.init, Some(VarDeclOrExpr::VarDecl(v)) if v.decls.is_empty()) {
            n.init = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_utils::{apply, squash};

    fn resolve(source: &str) -> (String, PassStats) {
        let (code, stats) = apply(&mut StringArrayResolver, source);
        (squash(&code), stats)
    }

    #[test]
    fn inlines_and_removes_unreferenced_array() {
        let (code, stats) = resolve(r#"var _0xab = ["foo", "bar"]; x(_0xab[0] + _0xab[1]);"#);
        assert_eq!(code, r#"x("foo" + "bar");"#);
        assert_eq!(stats.counter(STRINGS_DECODED), 2);
        assert_eq!(stats.counter(REMOVED_ARRAYS), 1);
    }

    #[test]
    fn accepts_string_and_hex_indices() {
        let (code, stats) =
            resolve(r#"var a = ["x", "y", "z"]; f(a["1"], a["0x2"], a["0X0"]);"#);
        assert_eq!(code, r#"f("y", "z", "x");"#);
        assert_eq!(stats.counter(STRINGS_DECODED), 3);
    }

    #[test]
    fn keeps_declaration_while_references_remain() {
        let (code, stats) = resolve(r#"var a = ["x"]; f(a[0], a[5], a[-1], a[i]);"#);
        assert!(code.starts_with("var a ="), "{code}");
        assert!(code.contains(r#"f("x", a[5], a[-1], a[i])"#), "{code}");
        assert_eq!(stats.counter(STRINGS_DECODED), 1);
        assert_eq!(stats.counter(REMOVED_ARRAYS), 0);
    }

    #[test]
    fn mixed_arrays_are_not_candidates() {
        let (code, stats) = resolve(r#"var a = ["x", 1]; f(a[0]);"#);
        assert!(code.contains("f(a[0])"));
        assert_eq!(stats.counter(STRINGS_DECODED), 0);
    }

    #[test]
    fn shadowing_binding_is_left_alone() {
        let (code, stats) =
            resolve(r#"var a = ["outer"]; function g(a) { return a[0]; } f(a[0]);"#);
        assert!(code.contains("return a[0];"), "{code}");
        assert!(code.contains(r#"f("outer")"#), "{code}");
        assert!(!code.contains("var a"), "{code}");
        assert_eq!(stats.counter(STRINGS_DECODED), 1);
        assert_eq!(stats.counter(REMOVED_ARRAYS), 1);
    }

    #[test]
    fn only_the_emptied_declarator_goes() {
        let (code, stats) = resolve(r#"var a = ["x"], b = 2; f(a[0], b);"#);
        assert_eq!(code, r#"var b = 2; f("x", b);"#);
        assert_eq!(stats.counter(REMOVED_ARRAYS), 1);
    }

    #[test]
    fn written_arrays_are_untouched() {
        for source in [
            r#"var a = ["x"]; a[0]++; f(a[0]);"#,
            r#"var a = ["x"]; a[0] = "y"; f(a[0]);"#,
            r#"var a = ["x"]; a = []; f(a[0]);"#,
            r#"var a = ["x"]; [a[0]] = o; f(a[0]);"#,
            r#"var a = ["x"]; for (a[0] in o); f(a[0]);"#,
            r#"var a = ["x", "y"]; delete a[0]; f(a[0]);"#,
        ] {
            let (code, stats) = resolve(source);
            assert!(code.contains("f(a[0])"), "{code}");
            assert_eq!(stats.counter(STRINGS_DECODED), 0);
        }
    }

    #[test]
    fn arrays_that_escape_or_are_called_through_are_untouched() {
        for source in [
            r#"var a = ["x", "y"]; a.reverse(); f(a[0]);"#,
            r#"var a = ["x", "y"]; a.push(a.shift()); f(a[0]);"#,
            r#"var a = ["x", "y"]; a["push"](a["shift"]()); f(a[0]);"#,
            r#"var a = ["x", "y"]; a[0](); f(a[0]);"#,
            r#"var a = ["x", "y"]; (function (arr, n) { while (--n) arr.push(arr.shift()); })(a, 0x1a3); f(a[0]);"#,
            r#"var a = ["x", "y"]; g(a); f(a[0]);"#,
            r#"var a = ["x", "y"]; f(a[0], a.length);"#,
            r#"var a = ["x", "y"]; a?.["sort"](); f(a[0]);"#,
        ] {
            let (code, stats) = resolve(source);
            assert!(code.contains("f(a[0]"), "{code}");
            assert_eq!(stats.counter(STRINGS_DECODED), 0, "{source}");
            assert_eq!(stats.counter(REMOVED_ARRAYS), 0, "{source}");
        }
    }

    /// Drop all whitespace; the printer's spacing after keywords is not under test.
    fn tight(code: &str) -> String {
        code.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn emptied_for_initializer_becomes_none() {
        let (code, stats) = resolve(r#"for (var a = ["x"]; i < 1; i++) f(a[0]);"#);
        assert_eq!(tight(&code), r#"for(;i<1;i++)f("x");"#);
        assert_eq!(stats.counter(REMOVED_ARRAYS), 1);
    }

    #[test]
    fn emptied_single_statement_slot_keeps_an_empty_statement() {
        let (code, stats) = resolve(r#"if (c) var a = ["x"]; f(a[0]);"#);
        assert_eq!(tight(&code), r#"if(c);f("x");"#);
        assert_eq!(stats.counter(REMOVED_ARRAYS), 1);
    }

    #[test]
    fn exported_arrays_are_not_candidates() {
        let (code, stats) = resolve(r#"export var a = ["x"]; f(a[0]);"#);
        assert!(code.contains("f(a[0])"), "{code}");
        assert_eq!(stats.counter(STRINGS_DECODED), 0);
    }

    #[test]
    fn index_forms() {
        let num = |v: f64| Expr::Lit(Lit::Num(Number { span: DUMMY_SP, value: v, raw: None }));
        let string = |s: &str| {
            Expr::Lit(Lit::Str(Str { span: DUMMY_SP, value: s.into(), raw: None }))
        };
        assert_eq!(static_index(&num(2.0)), Some(2));
        assert_eq!(static_index(&num(1.5)), None);
        assert_eq!(static_index(&string("10")), Some(10));
        assert_eq!(static_index(&string("0x1f")), Some(31));
        assert_eq!(static_index(&string("0x")), None);
        assert_eq!(static_index(&string("+1")), None);
        assert_eq!(static_index(&string("1e2")), None);
    }
}
