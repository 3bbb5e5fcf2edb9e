//! Error types for the deobfuscation pipeline.
//!
//! Only [`Error`] ever reaches the caller of [`crate::deobfuscate`]. Everything a
//! pass can raise is a [`PassError`], which the pipeline turns into a report note,
//! and per-binding rename trouble is a [`RenameError`] that never leaves its pass.

use thiserror::Error;

/// Fatal errors surfaced by [`crate::deobfuscate`].
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not valid JavaScript under the enabled syntax toggles.
    ///
    /// Raised before any pass runs; no partial output exists in this case.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
        /// 1-based line of the offending token.
        line: usize,
        /// 1-based column of the offending token.
        column: usize,
    },

    /// The code generator failed to write the transformed program.
    #[error("code generation failed: {0}")]
    Codegen(#[from] std::io::Error),

    /// The code generator produced bytes that are not UTF-8.
    #[error("code generation produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Failure raised from inside a single pass.
///
/// The pipeline records it as `<pass>-error:<message>` and keeps going with the
/// tree in whatever state the pass left it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    /// A string-array declaration slated for removal could not be found again.
    #[error("declaration of `{name}` vanished before cleanup")]
    MissingDeclaration { name: String },
}

/// Reasons a single binding could not be renamed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    /// JSX treats lowercase tags as host elements, so `var_N` would change meaning.
    #[error("`{name}` is used as a JSX element name")]
    JsxElement { name: String },

    /// Direct `eval` or a `with` statement can resolve names at run time.
    #[error("`{name}` may be resolved dynamically through eval/with")]
    DynamicScope { name: String },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
