//! PromQL support for query-assist
//!
//! This crate provides a typed PromQL syntax tree and turns it back into
//! query text, so that structured editor state can be written out as a query.
//!
//! # Architecture
//!
//! ```text
//! PromQL String → promql-parser → Expr → convert → ASTNode → serialize → PromQL String
//! ```
//!
//! # Modules
//!
//! - [`ast`] - Node types, operators and label matchers
//! - [`serialize`] - Compact and pretty-printed rendering of a tree
//! - [`parser`] - Parsing through the promql-parser crate plus tree analysis helpers
//! - [`duration`] - Prometheus duration literals
//! - [`functions`] - Signatures of the built-in functions
//! - [`error`] - Error types for PromQL operations
//!
//! # Example
//!
//! ```
//! use promql::{parser, serialize_compact};
//!
//! let ast = parser::parse("sum by(job)(rate(http_requests_total[300s]))").unwrap();
//! assert_eq!(serialize_compact(&ast), "sum by(job) (rate(http_requests_total[5m]))");
//! ```

pub mod ast;
pub mod duration;
pub mod error;
pub mod functions;
pub mod parser;
pub mod serialize;
pub mod utils;

pub use ast::{ASTNode, TimeAnchor};
pub use error::PromQLError;
pub use serialize::{serialize, serialize_compact, serialize_pretty};
