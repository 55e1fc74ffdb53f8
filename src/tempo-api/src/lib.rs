use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "client")]
pub mod client;
pub mod error;
pub mod v2;

pub use error::ClientError;
pub use v2::{TagSearchResponse, TagSearchScope, TagValue, TagValuesResponse};

#[cfg(feature = "client")]
pub use client::TempoClient;

/// GET /api/v2/search/tags?scope=<resource|span|intrinsic>
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TagScope {
    Resource,
    Span,
    Intrinsic,
}

impl TagScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagScope::Resource => "resource",
            TagScope::Span => "span",
            TagScope::Intrinsic => "intrinsic",
        }
    }
}

impl fmt::Display for TagScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource" => Ok(TagScope::Resource),
            "span" => Ok(TagScope::Span),
            "intrinsic" => Ok(TagScope::Intrinsic),
            _ => Err(()),
        }
    }
}

/// Parameters of a tag name search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTagsRequest {
    pub scope: TagScope,
    /// Start of the searched range (unix seconds)
    pub start: Option<i64>,
    /// End of the searched range (unix seconds)
    pub end: Option<i64>,
    pub limit: Option<u32>,
    pub max_stale_values: Option<u32>,
}

/// Parameters of a tag value search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTagValuesRequest {
    /// Attribute expression the values belong to, e.g. `resource.service.name` or `status`
    pub tag: String,
    /// Start of the searched range (unix seconds)
    pub start: Option<i64>,
    /// End of the searched range (unix seconds)
    pub end: Option<i64>,
    pub limit: Option<u32>,
    pub max_stale_values: Option<u32>,
}

/// Tag name and value discovery, as served by the Tempo search API
#[async_trait]
pub trait TagSearch: Send + Sync {
    async fn search_tags(&self, request: SearchTagsRequest)
    -> Result<TagSearchResponse, ClientError>;

    async fn search_tag_values(
        &self,
        request: SearchTagValuesRequest,
    ) -> Result<TagValuesResponse, ClientError>;
}
