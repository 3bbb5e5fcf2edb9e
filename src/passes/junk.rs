use swc_core::{
    common::{util::take::Take, DUMMY_SP},
    ecma::{
        ast::*,
        visit::{VisitMut, VisitMutWith},
    },
};

use super::{Pass, PassContext};
use crate::{
    error::PassError,
    report::{PassStats, DEAD_BLOCKS_REMOVED},
};

/// Removes no-op statements and collapses `if (true)` / `if (false)`.
///
/// `console.*(...)` calls are assumed to be the host console and free of side
/// effects. Nothing else is checked for purity.
pub struct JunkEliminator;

impl Pass for JunkEliminator {
    fn run(&mut self, program: &mut Program, _ctx: &PassContext) -> Result<PassStats, PassError> {
        let mut eliminator = Eliminator { removed: 0 };
        program.visit_mut_with(&mut eliminator);
        Ok(PassStats::new().with_counter(DEAD_BLOCKS_REMOVED, eliminator.removed))
    }
}

enum Verdict {
    Keep,
    Remove,
    /// Replace the statement with these, in place.
    Splice(Vec<Stmt>),
}

fn is_console_call(expr: &Expr) -> bool {
    let Expr::Call(CallExpr {
        callee: Callee::Expr(callee),
        ..
    }) = expr
    else {
        return false;
    };
    let Expr::Member(MemberExpr { obj, prop, .. }) = &**callee else {
        return false;
    };
    let named_method = match prop {
        MemberProp::Ident(_) => true,
        MemberProp::Computed(ComputedPropName { expr, .. }) => {
            matches!(&**expr, Expr::Lit(Lit::Str(_)))
        }
        _ => false,
    };
    named_method && matches!(&**obj, Expr::Ident(i) if &*i.sym == "console")
}

/// A leading string statement would become a directive once spliced into a
/// function or program body.
fn starts_with_string_stmt(block: &BlockStmt) -> bool {
    matches!(
        block.stmts.first(),
        Some(Stmt::Expr(ExprStmt { expr, .. })) if matches!(&**expr, Expr::Lit(Lit::Str(_)))
    )
}

/// `let`, `const`, `class` and function declarations are scoped to their block.
fn has_block_scoped_decl(block: &BlockStmt) -> bool {
    block.stmts.iter().any(|s| match s {
        Stmt::Decl(Decl::Var(v)) => v.kind != VarDeclKind::Var,
        Stmt::Decl(_) => true,
        _ => false,
    })
}

/// Statements a taken `if` branch turns into.
fn unwrap_branch(branch: Stmt) -> Vec<Stmt> {
    match branch {
        Stmt::Block(block) if !has_block_scoped_decl(&block) && !starts_with_string_stmt(&block) => {
            block.stmts
        }
        other => vec![other],
    }
}

struct Eliminator {
    removed: u64,
}

impl Eliminator {
    fn judge(&mut self, stmt: &mut Stmt) -> Verdict {
        let verdict = match stmt {
            Stmt::Debugger(_) | Stmt::Empty(_) => Verdict::Remove,
            Stmt::Expr(ExprStmt { expr, .. }) if is_console_call(expr) => Verdict::Remove,
            Stmt::If(IfStmt { test, cons, alt, .. }) => match &**test {
                Expr::Lit(Lit::Bool(Bool { value: true, .. })) => {
                    Verdict::Splice(unwrap_branch(*cons.take()))
                }
                Expr::Lit(Lit::Bool(Bool { value: false, .. })) => match alt.take() {
                    Some(alt) => Verdict::Splice(unwrap_branch(*alt)),
                    None => Verdict::Remove,
                },
                _ => Verdict::Keep,
            },
            _ => Verdict::Keep,
        };
        if !matches!(verdict, Verdict::Keep) {
            self.removed += 1;
        }
        verdict
    }

    /// Judge every statement of a list, children first.
    fn sweep<T>(&mut self, items: &mut Vec<T>, as_stmt: impl Fn(&mut T) -> Option<&mut Stmt>, wrap: impl Fn(Stmt) -> T)
    where
        T: VisitMutWith<Self>,
    {
        let mut out = Vec::with_capacity(items.len());
        for mut item in items.drain(..) {
            let Some(stmt) = as_stmt(&mut item) else {
                item.visit_mut_with(self);
                out.push(item);
                continue;
            };
            stmt.visit_mut_children_with(self);
            match self.judge(stmt) {
                Verdict::Keep => out.push(item),
                Verdict::Remove => {}
                Verdict::Splice(body) => out.extend(
                    body.into_iter()
                        .filter(|s| !matches!(s, Stmt::Empty(_)))
                        .map(&wrap),
                ),
            }
        }
        *items = out;
    }
}

impl VisitMut for Eliminator {
    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        self.sweep(stmts, |s| Some(s), |s| s);
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        self.sweep(
            items,
            |item| match item {
                ModuleItem::Stmt(s) => Some(s),
                ModuleItem::ModuleDecl(_) => None,
            },
            ModuleItem::Stmt,
        );
    }

    // Loop bodies, labels, if branches: exactly one statement must remain.
    fn visit_mut_stmt(&mut self, s: &mut Stmt) {
        s.visit_mut_children_with(self);
        if matches!(s, Stmt::Empty(_)) {
            return;
        }
        match self.judge(s) {
            Verdict::Keep => {}
            Verdict::Remove => *s = Stmt::Empty(EmptyStmt { span: DUMMY_SP }),
            Verdict::Splice(mut body) => {
                body.retain(|s| !matches!(s, Stmt::Empty(_)));
                *s = match body.len() {
                    0 => Stmt::Empty(EmptyStmt { span: DUMMY_SP }),
                    1 => body.remove(0),
                    _ => Stmt::Block(BlockStmt {
                        span: DUMMY_SP,
                        ctxt: Default::default(),
                        stmts: body,
                    }),
                };
            }
        }
    }

    fn visit_mut_if_stmt(&mut self, n: &mut IfStmt) {
        n.visit_mut_children_with(self);
        if matches!(n.alt.as_deref(), Some(Stmt::Empty(_))) {
            n.alt = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_utils::{apply, squash};

    fn clean(source: &str) -> (String, u64) {
        let (code, stats) = apply(&mut JunkEliminator, source);
        (squash(&code), stats.counter(DEAD_BLOCKS_REMOVED))
    }

    #[test]
    fn literal_false_takes_the_else_branch() {
        assert_eq!(clean("if (false) { a(); } else { b(); }"), ("b();".into(), 1));
        assert_eq!(clean("if (false) { a(); } c();"), ("c();".into(), 1));
        assert_eq!(clean("if (false) a(); else b();"), ("b();".into(), 1));
    }

    #[test]
    fn literal_true_splices_the_consequent() {
        assert_eq!(clean("if (true) a();"), ("a();".into(), 1));
        assert_eq!(clean("if (true) { a(); b(); } else { c(); }"), ("a(); b();".into(), 1));
    }

    #[test]
    fn block_scoped_bodies_stay_blocks() {
        let (code, count) = clean("if (true) { let x = 1; f(x); }");
        assert_eq!(code, "{ let x = 1; f(x); }");
        assert_eq!(count, 1);
    }

    #[test]
    fn removes_debugger_empty_and_console_calls() {
        assert_eq!(
            clean("debugger; ; console.log('x'); console.warn(1, 2); f();"),
            ("f();".into(), 4)
        );
        assert_eq!(
            clean(r#"console["log"]("x"); console['warn'](1); f();"#),
            ("f();".into(), 2)
        );
    }

    #[test]
    fn string_statements_are_not_spliced_into_directive_position() {
        let (code, count) = clean(r#"function f() { if (true) { "use strict"; g(); } }"#);
        assert_eq!(code, r#"function f() { { "use strict"; g(); } }"#);
        assert_eq!(count, 1);
    }

    #[test]
    fn keeps_everything_else() {
        for source in [
            "if (x) { a(); }",
            "log('x');",
            "console.log;",
            "console[m](1);",
            "x = console.log(1);",
            "if (1) { a(); }",
        ] {
            let (code, count) = clean(source);
            assert_eq!(count, 0, "{source}");
            assert!(!code.is_empty(), "{source}");
        }
    }

    /// Drop all whitespace; the printer's spacing after keywords is not under test.
    fn tight(code: &str) -> String {
        code.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn single_statement_positions_keep_a_statement() {
        let (code, count) = clean("while (x) debugger;");
        assert_eq!((tight(&code), count), ("while(x);".into(), 1));
        let (code, count) = clean("for (;;) if (true) { a(); b(); }");
        assert_eq!((tight(&code), count), ("for(;;){a();b();}".into(), 1));
        let (code, count) = clean("if (x) a(); else debugger;");
        assert_eq!((tight(&code), count), ("if(x)a();".into(), 1));
    }

    #[test]
    fn nested_junk_is_counted_once_each() {
        let (code, count) =
            clean("function f() { if (true) { debugger; g(); } if (false) h(); }");
        assert_eq!(code, "function f() { g(); }");
        assert_eq!(count, 3);
    }

    #[test]
    fn module_items_are_swept() {
        let (code, count) = clean("import a from 'a'; debugger; if (true) { a(); } export { a };");
        assert_eq!(tight(&code), "importafrom'a';a();export{a};");
        assert_eq!(count, 2);
    }
}
