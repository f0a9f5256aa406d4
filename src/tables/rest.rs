use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

use super::{Row, StoreError, TableQuery, TableStore};
use crate::config::TablesConfig;

/// Table client speaking the PostgREST dialect (`/rest/v1/<table>`).
#[derive(Clone)]
pub struct RestTableStore {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for RestTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTableStore")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl RestTableStore {
    pub fn new(config: &TablesConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    fn query_params(query: &TableQuery) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = query
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{value}")))
            .collect();

        if let Some(order) = &query.order {
            let direction = if order.descending { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    async fn read_rows(response: Response) -> Result<Vec<Row>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body)
                .unwrap_or_else(|| format!("Store request failed with status {status}"));
            warn!("Store rejected request ({}): {}", status, message);
            return Err(StoreError::Rejected(message));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(StoreError::Decode(format!("expected row object, got {other}"))),
                })
                .collect(),
            Value::Object(row) => Ok(vec![row]),
            other => Err(StoreError::Decode(format!("expected rows, got {other}"))),
        }
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "hint"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

#[async_trait]
impl TableStore for RestTableStore {
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        debug!("Inserting into {} with columns {:?}", table, row.keys().collect::<Vec<_>>());

        let response = self
            .authorize(self.http_client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(transport)?;

        Self::read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))
    }

    async fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Row>, StoreError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(Self::query_params(query));

        let response = self
            .authorize(self.http_client.get(self.table_url(table)))
            .query(&params)
            .send()
            .await
            .map_err(transport)?;

        Self::read_rows(response).await
    }

    async fn update(&self, table: &str, query: &TableQuery, patch: Row) -> Result<Vec<Row>, StoreError> {
        let response = self
            .authorize(self.http_client.patch(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(&Self::query_params(query))
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;

        Self::read_rows(response).await
    }
}
