//! Supabase/PostgREST table store

use super::{RangeFilter, TableStore, validate_identifier};
use crate::app::models::Row;
use crate::config::StoreConfig;
use crate::constants::{COUNT_PREFER, REST_PATH, UPSERT_PREFER};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

/// Table store backed by a PostgREST endpoint (`{url}/rest/v1/{table}`)
#[derive(Debug, Clone)]
pub struct RestTableStore {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: usize,
}

impl RestTableStore {
    /// Build a client from validated store settings
    pub fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: format!("{}/{}", config.url.trim_end_matches('/'), REST_PATH),
            api_key: config.api_key.clone(),
            page_size: config.page_size,
        })
    }

    fn table_url(&self, table: &str) -> Result<String> {
        Ok(format!("{}/{}", self.base_url, validate_identifier(table)?))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn filter_params(filter: &RangeFilter) -> Result<Vec<(String, String)>> {
        let column = validate_identifier(&filter.column)?;
        Ok(vec![
            (column.to_string(), format!("gte.{}", filter.gte)),
            (column.to_string(), format!("lt.{}", filter.lt)),
        ])
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::store(status.as_u16(), body))
    }
}

#[async_trait]
impl TableStore for RestTableStore {
    async fn select_range(
        &self,
        table: &str,
        filter: &RangeFilter,
        order_by: &[&str],
    ) -> Result<Vec<Row>> {
        let url = self.table_url(table)?;
        let order = order_by
            .iter()
            .map(|column| validate_identifier(column).map(|c| format!("{}.asc", c)))
            .collect::<Result<Vec<_>>>()?
            .join(",");

        let mut rows = Vec::new();
        let mut offset = 0usize;
        loop {
            let mut params = vec![("select".to_string(), "*".to_string())];
            params.extend(Self::filter_params(filter)?);
            if !order.is_empty() {
                params.push(("order".to_string(), order.clone()));
            }
            params.push(("limit".to_string(), self.page_size.to_string()));
            params.push(("offset".to_string(), offset.to_string()));

            let response = self
                .authorized(self.client.get(&url))
                .query(&params)
                .send()
                .await?;
            let page: Vec<Row> = Self::check(response).await?.json().await?;

            // The server may cap a page below `limit`; only an empty page ends the table
            let fetched = page.len();
            debug!(table, offset, rows = fetched, "Fetched page");
            if fetched == 0 {
                break;
            }
            rows.extend(page);
            offset += fetched;
        }
        Ok(rows)
    }

    async fn count(&self, table: &str, filter: Option<&RangeFilter>) -> Result<u64> {
        let url = self.table_url(table)?;
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(filter) = filter {
            params.extend(Self::filter_params(filter)?);
        }

        let response = self
            .authorized(self.client.head(&url))
            .header("Prefer", COUNT_PREFER)
            .query(&params)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let status = response.status().as_u16();
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::store(status, "missing Content-Range header"))?;

        content_range
            .rsplit('/')
            .next()
            .and_then(|total| total.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                Error::store(status, format!("unexpected Content-Range '{}'", content_range))
            })
    }

    async fn upsert(&self, table: &str, conflict_key: &[&str], rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.table_url(table)?;
        let on_conflict = conflict_key
            .iter()
            .map(|column| validate_identifier(column))
            .collect::<Result<Vec<_>>>()?
            .join(",");

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", UPSERT_PREFER)
            .query(&[("on_conflict", on_conflict)])
            .json(rows)
            .send()
            .await?;
        Self::check(response).await?;

        debug!(table, rows = rows.len(), "Upserted rows");
        Ok(())
    }
}
