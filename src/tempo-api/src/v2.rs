use serde::{Deserialize, Serialize};

/// GET /api/v2/search/tag/.service.name/values
///
/// See https://grafana.com/docs/tempo/latest/api_docs/#search-tag-values-v2
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct TagValuesResponse {
    #[serde(rename = "tagValues")]
    pub tag_values: Vec<TagValue>,
}

/// A typed tag value, e.g. `{"type": "string", "value": "shop-backend"}`
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct TagValue {
    /// Value type reported by Tempo: `string`, `int`, `keyword`, `float`, `bool`, `duration`, ...
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl TagValue {
    pub fn new(value_type: &str, value: &str) -> Self {
        Self {
            value_type: value_type.to_string(),
            value: Some(value.to_string()),
        }
    }
}

/// GET /api/v2/search/tags
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct TagSearchResponse {
    pub scopes: Vec<TagSearchScope>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct TagSearchScope {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TagSearchResponse {
    /// All tag names across scopes, in response order
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.scopes
            .iter()
            .flat_map(|scope| scope.tags.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tag_values_response() {
        let json = r#"{
            "tagValues": [
                {"type": "string", "value": "shop-backend"},
                {"type": "int", "value": "200"},
                {"type": "string"}
            ],
            "metrics": {"inspectedBytes": "1024"}
        }"#;

        let response: TagValuesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.tag_values.len(), 3);
        assert_eq!(response.tag_values[0], TagValue::new("string", "shop-backend"));
        assert_eq!(response.tag_values[1].value_type, "int");
        assert_eq!(response.tag_values[2].value, None);
    }

    #[test]
    fn test_deserialize_tag_search_response() {
        let json = r#"{
            "scopes": [
                {"name": "resource", "tags": ["service.name", "k8s.pod.name"]},
                {"name": "span", "tags": ["http.method"]},
                {"name": "intrinsic"}
            ]
        }"#;

        let response: TagSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.scopes.len(), 3);
        assert!(response.scopes[2].tags.is_empty());
        assert_eq!(
            response.tag_names().collect::<Vec<_>>(),
            vec!["service.name", "k8s.pod.name", "http.method"]
        );
    }
}
