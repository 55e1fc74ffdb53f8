use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempo_api::{
    ClientError, SearchTagValuesRequest, SearchTagsRequest, TagScope, TagSearch,
    TagSearchResponse, TagSearchScope, TagValue, TagValuesResponse,
};
use tokio::sync::Notify;
use traceql::complete::{EditorView, retrieve_options};
use traceql::{CompletionConfig, CompletionError, CompletionScope, complete};

/// Resource tag searches only answer after a span tag search went through, so the
/// span call always finishes first.
#[derive(Default)]
struct ReverseOrderClient {
    span_done: Notify,
}

#[async_trait]
impl TagSearch for ReverseOrderClient {
    async fn search_tags(&self, request: SearchTagsRequest) -> Result<TagSearchResponse, ClientError> {
        let tags = match request.scope {
            TagScope::Resource => {
                self.span_done.notified().await;
                vec!["service.name".to_string(), "k8s.namespace".to_string()]
            }
            TagScope::Span => {
                self.span_done.notify_one();
                vec!["http.method".to_string()]
            }
            TagScope::Intrinsic => vec!["duration".to_string(), "status".to_string()],
        };
        Ok(TagSearchResponse {
            scopes: vec![TagSearchScope {
                name: request.scope.to_string(),
                tags,
            }],
        })
    }

    async fn search_tag_values(
        &self,
        request: SearchTagValuesRequest,
    ) -> Result<TagValuesResponse, ClientError> {
        let tag_values = match request.tag.as_str() {
            "status" => vec![TagValue::new("keyword", "ok"), TagValue::new("keyword", "error")],
            _ => vec![TagValue::new("string", "shop-backend")],
        };
        Ok(TagValuesResponse { tag_values })
    }
}

struct FailingClient;

#[async_trait]
impl TagSearch for FailingClient {
    async fn search_tags(&self, _: SearchTagsRequest) -> Result<TagSearchResponse, ClientError> {
        Err(ClientError::Api {
            status: 503,
            message: "unavailable".to_string(),
        })
    }

    async fn search_tag_values(
        &self,
        _: SearchTagValuesRequest,
    ) -> Result<TagValuesResponse, ClientError> {
        Err(ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        })
    }
}

fn config_with(client: Arc<dyn TagSearch>) -> CompletionConfig {
    CompletionConfig {
        client: Some(client),
        ..Default::default()
    }
}

fn labels(result: &traceql::CompletionResult) -> Vec<&str> {
    result.options.iter().map(|o| o.label.as_str()).collect()
}

#[tokio::test]
async fn test_concurrent_retrieval_keeps_scope_order() {
    let config = config_with(Arc::new(ReverseOrderClient::default()));
    let scopes = [
        CompletionScope::tag_name(TagScope::Resource),
        CompletionScope::tag_name(TagScope::Span),
    ];

    // sequential retrieval would wait forever on the resource call
    let options = tokio::time::timeout(Duration::from_secs(5), retrieve_options(&config, &scopes))
        .await
        .expect("scopes are retrieved concurrently")
        .unwrap();

    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["service.name", "k8s.namespace", "http.method"]);
}

#[tokio::test]
async fn test_complete_bare_dot_queries_both_scopes() {
    let config = config_with(Arc::new(ReverseOrderClient::default()));

    let result = tokio::time::timeout(Duration::from_secs(5), complete(&config, "{ .", 3))
        .await
        .expect("scopes are retrieved concurrently")
        .unwrap()
        .expect("completions after a dot");

    assert_eq!(result.from, 3);
    assert_eq!(labels(&result), vec!["service.name", "k8s.namespace", "http.method"]);
}

#[tokio::test]
async fn test_complete_empty_filter() {
    let config = config_with(Arc::new(ReverseOrderClient::default()));

    let result = complete(&config, "{}", 1).await.unwrap().unwrap();
    assert_eq!(result.from, 1);
    assert_eq!(result.to, None);
    assert_eq!(labels(&result), vec!["span", "resource", "duration", "status"]);
}

#[tokio::test]
async fn test_complete_tag_value_and_apply() {
    let config = config_with(Arc::new(ReverseOrderClient::default()));

    let mut query = "{ resource.service.name = ".to_string();
    let pos = query.len();
    let result = complete(&config, &query, pos).await.unwrap().unwrap();
    assert_eq!(result.from, pos);
    assert_eq!(labels(&result), vec!["shop-backend"]);

    result.options[0].apply_to(&mut query, result.from, pos);
    assert_eq!(query, r#"{ resource.service.name = "shop-backend""#);
}

#[tokio::test]
async fn test_complete_inside_open_string_keeps_quote() {
    let config = config_with(Arc::new(ReverseOrderClient::default()));

    let mut query = r#"{ name="sh"#.to_string();
    let pos = query.len();
    let result = complete(&config, &query, pos).await.unwrap().unwrap();
    assert_eq!(result.from, 8);

    result.options[0].apply_to(&mut query, result.from, pos);
    assert_eq!(query, r#"{ name="shop-backend""#);
    assert_eq!(query.slice_doc(7, 8), "\"");
}

#[tokio::test]
async fn test_complete_keyword_values_are_unquoted() {
    let config = config_with(Arc::new(ReverseOrderClient::default()));

    let mut query = "{status=".to_string();
    let result = complete(&config, &query, 8).await.unwrap().unwrap();
    assert_eq!(labels(&result), vec!["ok", "error"]);

    result.options[1].apply_to(&mut query, result.from, 8);
    assert_eq!(query, "{status=error");
}

#[tokio::test]
async fn test_complete_without_client() {
    let result = complete(&CompletionConfig::default(), "{resource.", 10)
        .await
        .unwrap()
        .unwrap();
    assert!(result.options.is_empty());
    assert_eq!(result.from, 10);
}

#[tokio::test]
async fn test_complete_nothing_to_complete() {
    let config = config_with(Arc::new(FailingClient));
    assert!(complete(&config, "{ status = ok }", 15).await.unwrap().is_none());
    assert!(complete(&config, "{}", 99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_client_errors_propagate() {
    let config = config_with(Arc::new(FailingClient));

    let err = complete(&config, "{ span.", 7).await.unwrap_err();
    match err {
        CompletionError::Client(ClientError::Api { status, .. }) => assert_eq!(status, 503),
        other => panic!("unexpected error: {other}"),
    }

    // scope names alone need no backend, but one failing scope fails the whole request
    let err = complete(&config, "{", 1).await.unwrap_err();
    assert!(err.to_string().contains("unavailable"), "{err}");
}
