//! Schema fetching over the browser's fetch API

use async_trait::async_trait;
use formwork::error::FetchError;
use formwork::schema::{DynamicSchema, SchemaFetcher};
use gloo_net::http::Request;

#[derive(Debug, Clone, Copy, Default)]
pub struct GlooSchemaFetcher;

#[async_trait(?Send)]
impl SchemaFetcher for GlooSchemaFetcher {
    async fn fetch_schema(&self, url: &str) -> Result<DynamicSchema, FetchError> {
        let response = Request::get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.ok() {
            return Err(FetchError::Status {
                status: response.status(),
            });
        }

        response
            .json::<DynamicSchema>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
