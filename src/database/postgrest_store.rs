use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::database::store::{Filter, RecordStore, Select};
use crate::error::StoreError;

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgREST (Supabase) backend under `<url>/rest/v1`.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .default_headers(api_headers(&config.key)?)
            .build()
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn send(&self, url: &str, req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = req
            .send()
            .await
            .map_err(|e| connect_failed(url, e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body: Value = resp
            .json()
            .await
            .unwrap_or_else(|_| serde_json::json!({ "status": status.as_u16() }));
        Err(classify_rejection(status.as_u16(), &body))
    }

    async fn rows(resp: Response) -> Result<Vec<Value>, StoreError> {
        let body: Value = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::Decode(format!("expected array, got {}", other))),
        }
    }
}

fn api_headers(key: &str) -> Result<HeaderMap, StoreError> {
    let invalid = |e: reqwest::header::InvalidHeaderValue| {
        StoreError::Rejected {
            status: 0,
            detail: format!("access key is not a valid header value: {}", e),
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    Ok(headers)
}

fn connect_failed(url: &str, err: impl ToString) -> StoreError {
    let detail = err.to_string();
    warn!(%url, %detail, "postgrest_unreachable");
    StoreError::Unreachable(detail)
}

fn classify_rejection(status: u16, body: &Value) -> StoreError {
    let code = body.get("code").and_then(|v| v.as_str()).unwrap_or_default();
    let message = body
        .get("message")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| body.to_string());

    match code {
        PG_UNIQUE_VIOLATION => StoreError::UniqueViolation(message),
        PG_FOREIGN_KEY_VIOLATION => StoreError::ForeignKeyViolation(message),
        _ => StoreError::Rejected {
            status,
            detail: message,
        },
    }
}

/// Renders a filter as a PostgREST query pair, e.g. `("nip", "eq.123456")`.
pub fn filter_param(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq { column, value } => (column.clone(), format!("eq.{}", value)),
        // PostgREST accepts `*` in place of `%` inside URLs.
        Filter::ILike { column, value } => {
            (column.clone(), format!("ilike.*{}*", escape_like(value)))
        }
    }
}

/// Makes a search term match literally inside an ILIKE pattern. PostgREST
/// rewrites every `*` to `%` before Postgres sees it, so a literal asterisk
/// cannot survive; it is sent as `_` (any one character) instead.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn select_params(query: &Select) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(query.filters.iter().map(filter_param));
    if !query.order_by.is_empty() {
        let order = query
            .order_by
            .iter()
            .map(|c| format!("{}.asc", c))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

#[async_trait]
impl RecordStore for PostgrestStore {
    fn backend_tag(&self) -> &'static str {
        "postgrest"
    }

    async fn select(&self, table: &str, query: &Select) -> Result<Vec<Value>, StoreError> {
        let url = self.table_url(table);
        let params = select_params(query);
        debug!(%table, ?params, "postgrest_select");
        let resp = self.send(&url, self.client.get(&url).query(&params)).await?;
        Self::rows(resp).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let url = self.table_url(table);
        debug!(%table, "postgrest_insert");
        let resp = self.send(&url, self.client.post(&url).json(&row)).await?;
        Self::rows(resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))
    }

    async fn update(
        &self,
        table: &str,
        changes: Value,
        filter: &Filter,
    ) -> Result<Vec<Value>, StoreError> {
        let url = self.table_url(table);
        debug!(%table, column = filter.column(), "postgrest_update");
        let req = self
            .client
            .patch(&url)
            .query(&[filter_param(filter)])
            .json(&changes);
        let resp = self.send(&url, req).await?;
        Self::rows(resp).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        let url = self.table_url(table);
        debug!(%table, column = filter.column(), "postgrest_delete");
        let req = self.client.delete(&url).query(&[filter_param(filter)]);
        let resp = self.send(&url, req).await?;
        Ok(Self::rows(resp).await?.len() as u64)
    }
}
