//! Schema fetcher for native hosts.

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{DynamicSchema, SchemaFetcher};
use crate::error::FetchError;

/// Fetches schemas over HTTP, resolving relative endpoints against `base`
#[derive(Debug, Clone)]
pub struct HttpSchemaFetcher {
    client: Client,
    base: Option<Url>,
}

impl HttpSchemaFetcher {
    pub fn new(base: Option<&str>) -> Result<Self, FetchError> {
        let base = base
            .map(Url::parse)
            .transpose()
            .map_err(|e| FetchError::Request(format!("Invalid base URL: {}", e)))?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        let resolved = match &self.base {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|e| FetchError::Request(format!("Invalid endpoint '{}': {}", url, e)))
    }
}

#[async_trait(?Send)]
impl SchemaFetcher for HttpSchemaFetcher {
    async fn fetch_schema(&self, url: &str) -> Result<DynamicSchema, FetchError> {
        let url = self.resolve(url)?;
        tracing::debug!("Fetching schema from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<DynamicSchema>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_endpoint_needs_base() {
        let bare = HttpSchemaFetcher::new(None).unwrap();
        assert!(bare.resolve("/products/1/ingredient-choices/").is_err());

        let based = HttpSchemaFetcher::new(Some("https://example.com/app/")).unwrap();
        assert_eq!(
            based.resolve("/products/1/ingredient-choices/").unwrap().as_str(),
            "https://example.com/products/1/ingredient-choices/"
        );
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(matches!(HttpSchemaFetcher::new(Some("not a url")), Err(FetchError::Request(_))));
    }
}
