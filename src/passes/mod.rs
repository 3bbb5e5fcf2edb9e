//! The rewrite passes.
//!
//! | Pass | Kind | Counters |
//! |------|------|----------|
//! | [`StringArrayResolver`] | `stringArray` | `strings_decoded`, `removed_arrays` |
//! | [`LiteralDecoder`] | `hexBase64` | `strings_decoded` |
//! | [`ConstantFolder`] | `constFold` | `constants_folded` |
//! | [`JunkEliminator`] | `junk` | `dead_blocks_removed` |
//! | [`IdentifierRenamer`] | `idRename` | `identifiers_renamed` |
//!
//! Every pass borrows the program mutably for the duration of [`Pass::run`] and
//! keeps nothing from it afterwards.

use swc_core::{
    common::{Mark, SyntaxContext},
    ecma::ast::{Id, Program},
};

use crate::{error::PassError, options::PassKind, report::PassStats};

mod const_fold;
mod junk;
mod literal_decoder;
mod rename;
mod string_array;

pub use const_fold::ConstantFolder;
pub use junk::JunkEliminator;
pub use literal_decoder::LiteralDecoder;
pub use rename::IdentifierRenamer;
pub use string_array::StringArrayResolver;

/// One rewrite stage over the shared tree.
pub trait Pass {
    /// Rewrite `program` in place.
    ///
    /// # Errors
    ///
    /// A returned error is recorded by the pipeline; the tree keeps whatever
    /// changes were made before it.
    fn run(&mut self, program: &mut Program, ctx: &PassContext) -> Result<PassStats, PassError>;
}

/// Everything a pass may consult besides the tree itself.
#[derive(Debug, Clone, Copy)]
pub struct PassContext {
    pub verbose: bool,
    unresolved: SyntaxContext,
    top_level: SyntaxContext,
}

impl PassContext {
    /// Must be called inside `GLOBALS.set`, with the marks the resolver used.
    pub(crate) fn new(unresolved_mark: Mark, top_level_mark: Mark, verbose: bool) -> Self {
        Self {
            verbose,
            unresolved: SyntaxContext::empty().apply_mark(unresolved_mark),
            top_level: SyntaxContext::empty().apply_mark(top_level_mark),
        }
    }

    /// The identifier refers to nothing declared in the program (a host global).
    pub fn is_unresolved(&self, ctxt: SyntaxContext) -> bool {
        ctxt == self.unresolved
    }

    /// The binding is declared inside a function or block, not at program level.
    pub fn is_local(&self, id: &Id) -> bool {
        id.1 != SyntaxContext::empty() && id.1 != self.unresolved && id.1 != self.top_level
    }
}

/// Instantiate the pass for `kind`.
pub fn create(kind: PassKind) -> Box<dyn Pass> {
    match kind {
        PassKind::StringArray => Box::new(StringArrayResolver),
        PassKind::HexBase64 => Box::new(LiteralDecoder),
        PassKind::ConstFold => Box::new(ConstantFolder),
        PassKind::Junk => Box::new(JunkEliminator),
        PassKind::IdRename => Box::new(IdentifierRenamer),
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use swc_core::common::{comments::SingleThreadedComments, sync::Lrc, Globals, SourceMap, GLOBALS};

    use super::*;
    use crate::syntax;

    /// Parse `source`, run `pass` alone, and print the result.
    pub fn run_pass(pass: &mut dyn Pass, source: &str) -> (String, Result<PassStats, PassError>) {
        GLOBALS.set(&Globals::new(), || {
            let cm: Lrc<SourceMap> = Default::default();
            let comments = SingleThreadedComments::default();
            let mut parsed = syntax::parse(&cm, &comments, source).expect("test input parses");
            let ctx = PassContext::new(parsed.unresolved_mark, parsed.top_level_mark, false);
            let outcome = pass.run(&mut parsed.program, &ctx);
            let code = syntax::emit(&cm, &comments, parsed.program).expect("test output prints");
            (code, outcome)
        })
    }

    /// [`run_pass`] for passes expected to succeed.
    pub fn apply(pass: &mut dyn Pass, source: &str) -> (String, PassStats) {
        let (code, outcome) = run_pass(pass, source);
        (code, outcome.expect("pass succeeds"))
    }

    /// Collapse whitespace so assertions don't depend on the printer's layout.
    pub fn squash(code: &str) -> String {
        code.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
