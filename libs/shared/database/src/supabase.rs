use std::time::{Duration, Instant};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DatabaseError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client over the PostgREST endpoint of the document store.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.service_key.is_empty()
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    fn get_headers(&self) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|e| DatabaseError::Auth(format!("Invalid service key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|e| DatabaseError::Auth(format!("Invalid service key: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, DatabaseError> {
        if !self.is_configured() {
            return Err(DatabaseError::Unavailable(
                "Document store is not configured".to_string(),
            ));
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => DatabaseError::Auth(error_text),
                404 => DatabaseError::NotFound(error_text),
                409 => DatabaseError::Conflict(error_text),
                code => DatabaseError::Api {
                    status: code,
                    message: error_text,
                },
            });
        }

        Ok(response)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, HeaderMap::new())
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, Some(headers)).await?;
        let text = response.text().await?;
        // PostgREST answers some writes with an empty body.
        let text = if text.trim().is_empty() { "null" } else { &text };
        Ok(serde_json::from_str(text)?)
    }

    pub async fn select<T>(&self, table: &str, query: &str) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, &table_path(table, query), None)
            .await
    }

    pub async fn select_one<T>(&self, table: &str, query: &str) -> Result<Option<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let query = if query.is_empty() {
            "limit=1".to_string()
        } else {
            format!("{}&limit=1", query)
        };
        let rows: Vec<T> = self.select(table, &query).await?;
        Ok(rows.into_iter().next())
    }

    /// Selects a page of rows along with the total number of matching rows.
    pub async fn select_with_count<T>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<(Vec<T>, u64), DatabaseError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static("count=exact"),
        );

        let response = self
            .send(Method::GET, &table_path(table, query), None, Some(headers))
            .await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let rows: Vec<T> = response.json().await?;
        let total = total.unwrap_or(rows.len() as u64);
        Ok((rows, total))
    }

    pub async fn count(&self, table: &str, query: &str) -> Result<u64, DatabaseError> {
        let query = if query.is_empty() {
            "select=id&limit=1".to_string()
        } else {
            format!("{}&select=id&limit=1", query)
        };
        let (_, total): (Vec<Value>, u64) = self.select_with_count(table, &query).await?;
        Ok(total)
    }

    pub async fn insert<T, B>(&self, table: &str, body: &B) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let rows: Vec<T> = self
            .request_with_headers(
                Method::POST,
                &table_path(table, ""),
                Some(serde_json::to_value(body)?),
                return_representation(),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DatabaseError::Decode(format!("Insert into {} returned no rows", table)))
    }

    pub async fn update<T, B>(&self, table: &str, query: &str, body: &B) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.request_with_headers(
            Method::PATCH,
            &table_path(table, query),
            Some(serde_json::to_value(body)?),
            return_representation(),
        )
        .await
    }

    pub async fn delete(&self, table: &str, query: &str) -> Result<(), DatabaseError> {
        self.send(Method::DELETE, &table_path(table, query), None, None)
            .await?;
        Ok(())
    }

    /// Timed round trip to the REST root. Any HTTP answer counts as reachable.
    pub async fn ping(&self) -> Result<Duration, DatabaseError> {
        if !self.is_configured() {
            return Err(DatabaseError::Unavailable(
                "Document store is not configured".to_string(),
            ));
        }

        let started = Instant::now();
        self.client
            .get(format!("{}/rest/v1/", self.base_url))
            .headers(self.get_headers()?)
            .send()
            .await
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;

        Ok(started.elapsed())
    }
}

fn table_path(table: &str, query: &str) -> String {
    if query.is_empty() {
        format!("/rest/v1/{}", table)
    } else {
        format!("/rest/v1/{}?{}", table, query)
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("prefer"),
        HeaderValue::from_static("return=representation"),
    );
    headers
}

/// `0-9/57` → 57, `*/0` → 0.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}
