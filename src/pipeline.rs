//! Runs the selected passes, in their fixed order, over one program.

use swc_core::ecma::ast::Program;

use crate::{
    options::{DeobfuscateOptions, PassKind},
    passes::{self, PassContext},
    report::TransformationReport,
};

/// Run every enabled pass against `program` and fold the outcomes into a report.
///
/// A failing pass never stops the run: its error becomes a note and the next
/// pass sees the tree as the failed one left it.
pub(crate) fn run(
    program: &mut Program,
    options: &DeobfuscateOptions,
    ctx: &PassContext,
) -> TransformationReport {
    let mut report = TransformationReport::new();

    for kind in PassKind::all() {
        if !options.is_enabled(kind) {
            if options.verbose {
                log::info!("Skipping pass {kind}");
            }
            continue;
        }

        let outcome = passes::create(kind).run(program, ctx);
        match &outcome {
            Ok(stats) if options.verbose => log::info!("Pass {kind} finished: {stats:?}"),
            Ok(_) => {}
            Err(err) => log::warn!("Pass {kind} failed: {err}"),
        }
        report.absorb(kind, outcome);
    }

    report
}
