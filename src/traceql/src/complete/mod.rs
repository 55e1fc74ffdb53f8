//! Autocompletion for TraceQL filters.
//!
//! Completion runs in two phases:
//!
//! 1. [`identify_completions`] walks the syntax tree at the cursor and decides which
//!    completion scopes apply (scope names, tag names of a scope, values of a tag) and
//!    which text range a chosen option replaces. This is pure and synchronous.
//! 2. [`retrieve_options`] turns the scopes into options, querying the tag search backend
//!    concurrently for every scope that needs it.
//!
//! ```
//! use traceql::complete::{CompletionScope, identify_completions};
//! use traceql::syntax::parse;
//!
//! let source = "{resource.";
//! let tree = parse(source).syntax();
//! let completions = identify_completions(source, source.len(), &tree).unwrap();
//! assert_eq!(completions.from, 10);
//! assert!(matches!(completions.scopes[0], CompletionScope::TagName { .. }));
//! ```

mod apply;
mod resolve;
mod retrieve;

use std::fmt;
use std::sync::Arc;

use common::TimeRange;
use common::config::CompletionSettings;
use tempo_api::{TagScope, TagSearch};

use crate::error::CompletionError;
use crate::syntax;

pub use apply::{EditorView, apply_quoted_completion};
pub use resolve::identify_completions;
pub use retrieve::retrieve_options;

/// A universe of completion options
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompletionScope {
    /// The scope qualifiers themselves, `span` and `resource`
    Scopes,
    /// Tag names of one scope
    TagName { scope: TagScope },
    /// Values of a tag, `tag` is the attribute expression text, e.g. `resource.service.name`
    TagValue { tag: String },
}

impl CompletionScope {
    pub fn tag_name(scope: TagScope) -> Self {
        Self::TagName { scope }
    }

    pub fn tag_value(tag: impl Into<String>) -> Self {
        Self::TagValue { tag: tag.into() }
    }
}

/// Scopes that apply at a cursor position, and the text range a completion replaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completions {
    pub scopes: Vec<CompletionScope>,
    pub from: usize,
    /// End of the replaced range; `None` replaces up to the cursor
    pub to: Option<usize>,
}

impl Completions {
    pub fn new(scopes: Vec<CompletionScope>, from: usize) -> Self {
        Self {
            scopes,
            from,
            to: None,
        }
    }
}

/// Inserts a chosen completion into an editor
pub type ApplyFn = fn(&mut dyn EditorView, &CompletionItem, usize, usize);

/// One option in a completion list
#[derive(Debug, Clone)]
pub struct CompletionItem {
    /// Text inserted when the option is chosen
    pub label: String,
    /// Text shown in the list, when it differs from the label
    pub display_label: Option<String>,
    /// Custom insertion, used instead of replacing the range with `label`
    pub apply: Option<ApplyFn>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            display_label: None,
            apply: None,
        }
    }

    /// Text shown in a completion list
    pub fn display(&self) -> &str {
        self.display_label.as_deref().unwrap_or(&self.label)
    }

    /// Insert this option into `view`, replacing `from..to`
    pub fn apply_to(&self, view: &mut dyn EditorView, from: usize, to: usize) {
        match self.apply {
            Some(apply) => apply(view, self, from, to),
            None => view.insert_completion_text(&self.label, from, to),
        }
    }
}

/// Dependencies of option retrieval
#[derive(Clone, Default)]
pub struct CompletionConfig {
    /// Tag search backend; without one tag names and values complete to nothing
    pub client: Option<Arc<dyn TagSearch>>,
    pub time_range: Option<TimeRange>,
    pub limit: Option<u32>,
    pub max_stale_values: Option<u32>,
}

impl CompletionConfig {
    pub fn from_settings(settings: &CompletionSettings, client: Option<Arc<dyn TagSearch>>) -> Self {
        Self {
            client,
            time_range: Some(TimeRange::last(settings.lookback)),
            limit: settings.limit,
            max_stale_values: settings.max_stale_values,
        }
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("client", &self.client.as_ref().map(|_| "TagSearch"))
            .field("time_range", &self.time_range)
            .field("limit", &self.limit)
            .field("max_stale_values", &self.max_stale_values)
            .finish()
    }
}

/// Options for a cursor position, and the range they replace
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub options: Vec<CompletionItem>,
    pub from: usize,
    pub to: Option<usize>,
}

/// Complete the TraceQL query `source` at byte offset `pos`.
///
/// Returns `Ok(None)` when nothing can be completed at the cursor.
#[tracing::instrument(skip(config), fields(len = source.len()))]
pub async fn complete(
    config: &CompletionConfig,
    source: &str,
    pos: usize,
) -> Result<Option<CompletionResult>, CompletionError> {
    // rowan trees are not Send, keep the tree out of the awaiting part
    let completions = {
        let tree = syntax::parse(source).syntax();
        identify_completions(source, pos, &tree)
    };
    let Some(completions) = completions else {
        log::debug!("No completion scopes at offset {pos}");
        return Ok(None);
    };

    let options = retrieve_options(config, &completions.scopes).await?;
    Ok(Some(CompletionResult {
        options,
        from: completions.from,
        to: completions.to,
    }))
}
