//! TraceQL support for query-assist
//!
//! - [`syntax`] - Lossless, error-recovering concrete syntax tree for TraceQL filters
//! - [`complete`] - Cursor-aware completion of scopes, tag names and tag values
//!
//! ```text
//! query + cursor → syntax::parse → identify_completions → retrieve_options → options
//!                                                        (Tempo tag search)
//! ```

pub mod complete;
pub mod error;
pub mod syntax;

pub use complete::{
    CompletionConfig, CompletionItem, CompletionResult, CompletionScope, Completions, complete,
};
pub use error::CompletionError;
