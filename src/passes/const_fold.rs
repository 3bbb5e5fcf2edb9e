use swc_core::{
    common::util::take::Take,
    ecma::{
        ast::*,
        visit::{VisitMut, VisitMutWith},
    },
};

use super::{Pass, PassContext};
use crate::{
    error::PassError,
    report::{PassStats, CONSTANTS_FOLDED},
    value::{js_pow, to_int32, to_uint32, LitValue},
};

/// Folds binary and logical expressions whose operands are both literals.
///
/// Works bottom-up, so `1 + 2 + 3` collapses in one run.
pub struct ConstantFolder;

impl Pass for ConstantFolder {
    fn run(&mut self, program: &mut Program, _ctx: &PassContext) -> Result<PassStats, PassError> {
        let mut folder = Folder { folded: 0 };
        program.visit_mut_with(&mut folder);
        Ok(PassStats::new().with_counter(CONSTANTS_FOLDED, folder.folded))
    }
}

struct Folder {
    folded: u64,
}

impl VisitMut for Folder {
    fn visit_mut_expr(&mut self, e: &mut Expr) {
        e.visit_mut_children_with(self);

        let Expr::Bin(bin) = e else {
            return;
        };
        let Some(left) = LitValue::from_expr(&bin.left) else {
            return;
        };

        match bin.op {
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                // The discarded side is dropped even if it has side effects.
                let keep_left = match bin.op {
                    BinaryOp::LogicalAnd => !left.is_truthy(),
                    _ => left.is_truthy(),
                };
                *e = if keep_left {
                    *bin.left.take()
                } else {
                    *bin.right.take()
                };
                self.folded += 1;
            }
            op => {
                let Some(right) = LitValue::from_expr(&bin.right) else {
                    return;
                };
                if let Some(result) = fold_binary(op, &left, &right) {
                    *e = result.into_expr();
                    self.folded += 1;
                }
            }
        }
    }
}

/// Evaluate `left op right` over literal values.
///
/// `None` means "leave it": unsupported operator, a string operand outside `+`,
/// or a NaN or infinite result. Neither has a literal form, and the global
/// names `NaN` and `Infinity` can be shadowed.
fn fold_binary(op: BinaryOp, left: &LitValue, right: &LitValue) -> Option<LitValue> {
    if op == BinaryOp::Add
        && (matches!(left, LitValue::Str(_)) || matches!(right, LitValue::Str(_)))
    {
        return Some(LitValue::Str(format!(
            "{}{}",
            left.to_js_string(),
            right.to_js_string()
        )));
    }

    let (l, r) = (left.to_number()?, right.to_number()?);
    let result = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        // Rust's `%` on f64 is fmod, same as JS.
        BinaryOp::Mod => l % r,
        BinaryOp::Exp => js_pow(l, r),
        BinaryOp::BitOr => f64::from(to_int32(l) | to_int32(r)),
        BinaryOp::BitAnd => f64::from(to_int32(l) & to_int32(r)),
        BinaryOp::BitXor => f64::from(to_int32(l) ^ to_int32(r)),
        BinaryOp::LShift => f64::from(to_int32(l).wrapping_shl(to_uint32(r) & 31)),
        BinaryOp::RShift => f64::from(to_int32(l) >> (to_uint32(r) & 31)),
        _ => return None,
    };

    if !result.is_finite() {
        return None;
    }
    Some(LitValue::Number(result))
}
