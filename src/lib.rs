//! Static deobfuscation for JavaScript.
//!
//! [`deobfuscate`] parses a program, runs a fixed sequence of rewrite passes over
//! the tree and prints it back. Nothing in the analyzed program is ever executed:
//! every rewrite is derived from literals and syntax alone.
//!
//! ```no_run
//! use js_deobfuscator::{deobfuscate, DeobfuscateOptions};
//!
//! let out = deobfuscate(r#"var _0xab = ["foo"]; x(_0xab[0]);"#, &DeobfuscateOptions::default())?;
//! assert_eq!(out.code.trim(), r#"x("foo");"#);
//! # Ok::<(), js_deobfuscator::Error>(())
//! ```

use swc_core::common::{comments::SingleThreadedComments, sync::Lrc, Globals, SourceMap, GLOBALS};

mod error;
mod options;
mod pipeline;
mod report;
mod scope;
mod syntax;
mod value;

pub mod passes;

pub use error::{Error, PassError, RenameError, Result};
pub use options::{DeobfuscateOptions, PassKind};
pub use report::{
    PassStats, TransformationReport, CONSTANTS_FOLDED, DEAD_BLOCKS_REMOVED, FUNCTIONS_INLINED,
    IDENTIFIERS_RENAMED, REMOVED_ARRAYS, STRINGS_DECODED,
};
pub use value::LitValue;

/// Output of one [`deobfuscate`] call.
#[derive(Debug, Clone)]
pub struct Deobfuscated {
    /// The rewritten program, comments included.
    pub code: String,
    pub report: TransformationReport,
}

/// Deobfuscate `source`.
///
/// Only a syntax error (or a printer failure) is an error. Passes that fail are
/// recorded in the report's notes and the remaining passes still run.
pub fn deobfuscate(source: &str, options: &DeobfuscateOptions) -> Result<Deobfuscated> {
    GLOBALS.set(&Globals::new(), || {
        let cm: Lrc<SourceMap> = Default::default();
        let comments = SingleThreadedComments::default();

        let mut parsed = syntax::parse(&cm, &comments, source)?;
        let ctx = passes::PassContext::new(
            parsed.unresolved_mark,
            parsed.top_level_mark,
            options.verbose,
        );
        let report = pipeline::run(&mut parsed.program, options, &ctx);
        let code = syntax::emit(&cm, &comments, parsed.program)?;

        Ok(Deobfuscated { code, report })
    })
}
