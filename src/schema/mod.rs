//! Remote field schemas and the rows materialized from them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::choice::ChoiceTable;
use crate::error::FetchError;

#[cfg(not(target_arch = "wasm32"))]
pub mod http;
pub mod materializer;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpSchemaFetcher;
pub use materializer::{FetchDisposition, FetchTicket, SchemaMaterializer};

/// One dependent field of a fetched schema
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    pub unit: String,
    pub choices: ChoiceTable,
}

/// Fetched schema, in the order the endpoint returned it
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DynamicSchema {
    pub entries: Vec<SchemaEntry>,
}

impl DynamicSchema {
    pub fn from_json(raw: &str) -> Result<Self, FetchError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Endpoint URL with a placeholder standing in for the driver value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointTemplate {
    pub template: String,
    pub placeholder: String,
}

impl EndpointTemplate {
    pub fn new(template: &str, placeholder: &str) -> Self {
        Self {
            template: template.to_string(),
            placeholder: placeholder.to_string(),
        }
    }

    /// Substitutes the first placeholder occurrence with the encoded value
    pub fn resolve(&self, value: &str) -> String {
        self.template
            .replacen(&self.placeholder, &urlencoding::encode(value), 1)
    }
}

/// Product-type style binding: a driver whose value selects a remote schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMaterialize {
    pub driver: String,
    /// Element the generated rows are appended to
    pub container: String,
    pub endpoint: EndpointTemplate,
}

/// Source of dependent-field schemas
#[async_trait(?Send)]
pub trait SchemaFetcher {
    async fn fetch_schema(&self, url: &str) -> Result<DynamicSchema, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_substitutes_first_placeholder() {
        let endpoint = EndpointTemplate::new("/products/999/ingredient-choices/", "999");
        assert_eq!(endpoint.resolve("12"), "/products/12/ingredient-choices/");
        assert_eq!(endpoint.resolve("a b"), "/products/a%20b/ingredient-choices/");

        let twice = EndpointTemplate::new("/999/999/", "999");
        assert_eq!(twice.resolve("1"), "/1/999/");
    }

    #[test]
    fn test_schema_decodes_choice_pairs_in_order() {
        let schema = DynamicSchema::from_json(
            r#"[{"name": "Flour", "unit": "kg", "choices": [["1", "Type A"], [2, "Type C"]]},
                {"name": "Sugar", "unit": "kg", "choices": []}]"#,
        )
        .unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.entries[0].name, "Flour");
        assert_eq!(schema.entries[0].choices, ChoiceTable::new([("1", "Type A"), ("2", "Type C")]));
        assert!(schema.entries[1].choices.is_empty());
    }

    #[test]
    fn test_schema_rejects_wrong_shape() {
        assert!(matches!(
            DynamicSchema::from_json(r#"{"name": "Flour"}"#),
            Err(FetchError::Decode(_))
        ));
    }
}
