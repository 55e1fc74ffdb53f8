//! Turn completion scopes into completion options.

use chrono::Utc;
use futures::future::try_join_all;
use tempo_api::{SearchTagValuesRequest, SearchTagsRequest, TagScope};

use super::{CompletionConfig, CompletionItem, CompletionScope, apply_quoted_completion};
use crate::error::CompletionError;

const EMPTY_STRING_LABEL: &str = "(empty string)";

/// Retrieve the options of all scopes concurrently, concatenated in scope order.
///
/// Fails as soon as one backend call fails.
pub async fn retrieve_options(
    config: &CompletionConfig,
    scopes: &[CompletionScope],
) -> Result<Vec<CompletionItem>, CompletionError> {
    log::debug!("Retrieving completion options for {} scopes", scopes.len());
    let per_scope = try_join_all(scopes.iter().map(|scope| retrieve_scope(config, scope))).await?;
    Ok(per_scope.into_iter().flatten().collect())
}

async fn retrieve_scope(
    config: &CompletionConfig,
    scope: &CompletionScope,
) -> Result<Vec<CompletionItem>, CompletionError> {
    match scope {
        CompletionScope::Scopes => Ok(vec![
            CompletionItem::new("span"),
            CompletionItem::new("resource"),
        ]),
        CompletionScope::TagName { scope } => complete_tag_name(config, *scope).await,
        CompletionScope::TagValue { tag } => complete_tag_value(config, tag).await,
    }
}

fn unix_bounds(config: &CompletionConfig) -> (Option<i64>, Option<i64>) {
    match &config.time_range {
        Some(range) => {
            let bounds = range.to_unix_bounds(Utc::now());
            (Some(bounds.start), Some(bounds.end))
        }
        None => (None, None),
    }
}

async fn complete_tag_name(
    config: &CompletionConfig,
    scope: TagScope,
) -> Result<Vec<CompletionItem>, CompletionError> {
    let Some(client) = &config.client else {
        return Ok(Vec::new());
    };

    let (start, end) = unix_bounds(config);
    let response = client
        .search_tags(SearchTagsRequest {
            scope,
            start,
            end,
            limit: config.limit,
            max_stale_values: config.max_stale_values,
        })
        .await
        .inspect_err(|e| log::warn!("Tag name search for scope {scope} failed: {e}"))?;

    Ok(response.tag_names().map(CompletionItem::new).collect())
}

async fn complete_tag_value(
    config: &CompletionConfig,
    tag: &str,
) -> Result<Vec<CompletionItem>, CompletionError> {
    let Some(client) = &config.client else {
        return Ok(Vec::new());
    };

    let (start, end) = unix_bounds(config);
    let response = client
        .search_tag_values(SearchTagValuesRequest {
            tag: tag.to_string(),
            start,
            end,
            limit: config.limit,
            max_stale_values: config.max_stale_values,
        })
        .await
        .inspect_err(|e| log::warn!("Tag value search for {tag} failed: {e}"))?;

    let options = response
        .tag_values
        .into_iter()
        .filter_map(|tag_value| {
            let apply = match tag_value.value_type.as_str() {
                "string" => Some(apply_quoted_completion as super::ApplyFn),
                "keyword" | "int" => None,
                _ => return None,
            };
            let display_label = match tag_value.value.as_deref() {
                None | Some("") => EMPTY_STRING_LABEL.to_string(),
                Some(value) => value.to_string(),
            };
            Some(CompletionItem {
                label: tag_value.value.unwrap_or_default(),
                display_label: Some(display_label),
                apply,
            })
        })
        .collect();
    Ok(options)
}
