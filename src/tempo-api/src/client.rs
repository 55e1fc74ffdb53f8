use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{
    ClientError, SearchTagValuesRequest, SearchTagsRequest, TagSearch, TagSearchResponse,
    TagValuesResponse,
};

/// HTTP client for the Tempo tag search API
#[derive(Debug, Clone)]
pub struct TempoClient {
    base_url: Url,
    http: reqwest::Client,
}

impl TempoClient {
    /// Create a new client pointing at the given Tempo base URL
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_http_client(base_url, http)
    }

    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        // a trailing slash keeps the base path when segments are appended
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');

        Ok(Self {
            base_url: Url::parse(&base)?,
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of `GET /api/v2/search/tags`
    pub fn tags_url(&self, request: &SearchTagsRequest) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&["api", "v2", "search", "tags"])?;
        url.query_pairs_mut()
            .append_pair("scope", request.scope.as_str());
        append_search_params(
            &mut url,
            request.start,
            request.end,
            request.limit,
            request.max_stale_values,
        );
        Ok(url)
    }

    /// URL of `GET /api/v2/search/tag/<tag>/values`, the tag is encoded as a single path segment
    pub fn tag_values_url(&self, request: &SearchTagValuesRequest) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&["api", "v2", "search", "tag", &request.tag, "values"])?;
        append_search_params(
            &mut url,
            request.start,
            request.end,
            request.limit,
            request.max_stale_values,
        );
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a GET request and deserialize the response
    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        log::debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }
}

fn append_search_params(
    url: &mut Url,
    start: Option<i64>,
    end: Option<i64>,
    limit: Option<u32>,
    max_stale_values: Option<u32>,
) {
    let params = [
        ("start", start.map(|v| v.to_string())),
        ("end", end.map(|v| v.to_string())),
        ("limit", limit.map(|v| v.to_string())),
        ("maxStaleValues", max_stale_values.map(|v| v.to_string())),
    ];
    let mut params = params
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .peekable();

    // an untouched query would otherwise leave a dangling `?`
    if params.peek().is_some() {
        url.query_pairs_mut().extend_pairs(params);
    }
}

#[async_trait]
impl TagSearch for TempoClient {
    #[tracing::instrument(skip(self), fields(scope = %request.scope))]
    async fn search_tags(
        &self,
        request: SearchTagsRequest,
    ) -> Result<TagSearchResponse, ClientError> {
        let url = self.tags_url(&request)?;
        self.get(url).await
    }

    #[tracing::instrument(skip(self), fields(tag = %request.tag))]
    async fn search_tag_values(
        &self,
        request: SearchTagValuesRequest,
    ) -> Result<TagValuesResponse, ClientError> {
        let url = self.tag_values_url(&request)?;
        self.get(url).await
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    if resp.status().is_success() {
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    } else {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        log::warn!("Tempo returned {status}: {message}");
        Err(ClientError::Api { status, message })
    }
}
