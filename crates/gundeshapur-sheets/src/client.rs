//! Google Sheets client with connection pooling

use crate::a1::{quote_tab, CellAddress};
use crate::api::{
    AppendValuesResponse, BatchUpdateValuesRequest, Spreadsheet, ValueRange, USER_ENTERED,
};
use crate::config::SheetsClientConfig;
use crate::error::{SheetsError, SheetsResult};
use crate::response::{from_reqwest, HttpResponse};
use crate::store::{AppendOutcome, Grid, SpreadsheetStore};
use async_trait::async_trait;
use gundeshapur_common::UserProfile;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;

/// Async client for the Sheets v4 REST API
///
/// # Example
///
/// ```ignore
/// use gundeshapur_sheets::{SheetsClient, SheetsClientConfig, SpreadsheetStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = SheetsClientConfig::new()
///         .api_key("AIza...")
///         .access_token("ya29...");
///
///     let client = SheetsClient::new(config)?;
///     let grid = client.get_values("1AbC...", "Books").await?;
///     println!("{} rows", grid.len());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SheetsClient {
    inner: Arc<SheetsClientInner>,
}

struct SheetsClientInner {
    client: reqwest::Client,
    config: SheetsClientConfig,
}

impl SheetsClient {
    /// Create a new client with the given configuration
    pub fn new(config: SheetsClientConfig) -> SheetsResult<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.gzip);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(SheetsClientInner { client, config }),
        })
    }

    /// Get the configured Sheets endpoint
    pub fn base_url(&self) -> &str {
        &self.inner.config.sheets_base_url
    }

    /// Look up the principal that owns the access token
    pub async fn user_profile(&self) -> SheetsResult<UserProfile> {
        if self.inner.config.access_token.is_none() {
            return Err(SheetsError::InvalidRequest(
                "an access token is required to look up the signed-in user".to_string(),
            ));
        }
        let url = Url::parse(&self.inner.config.userinfo_url)?;
        let response = self.send(Method::GET, url, None).await?;
        response.json_as()
    }

    /// `<base>/v4/spreadsheets[/<segments>...]`
    fn spreadsheets_url(&self, segments: &[&str]) -> SheetsResult<Url> {
        let mut url = Url::parse(&format!(
            "{}/v4/spreadsheets",
            self.inner.config.sheets_base_url
        ))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidRequest("base URL cannot hold a path".to_string()))?
            .extend(segments);
        if let Some(key) = &self.inner.config.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> SheetsResult<HttpResponse> {
        let path = url.path().to_string();
        let start = Instant::now();

        let mut request = self.inner.client.request(method.clone(), url);
        if let Some(token) = &self.inner.config.access_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let latency_ms = start.elapsed().as_millis() as u64;
        let response = from_reqwest(response).await?;

        debug!(
            %method,
            path = %path,
            status = response.status_code,
            latency_ms,
            "Sheets API call"
        );

        response.error_for_status()
    }
}

#[async_trait]
impl SpreadsheetStore for SheetsClient {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> SheetsResult<Grid> {
        let url = self.spreadsheets_url(&[spreadsheet_id, "values", range])?;
        let response = self.send(Method::GET, url, None).await?;
        let value_range: ValueRange = response.json_as()?;
        Ok(value_range.values)
    }

    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        rows: Vec<Vec<Value>>,
    ) -> SheetsResult<AppendOutcome> {
        let range = quote_tab(tab);
        let mut url =
            self.spreadsheets_url(&[spreadsheet_id, "values", &format!("{}:append", range)])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", USER_ENTERED);

        let body = serde_json::to_value(ValueRange {
            range: None,
            major_dimension: None,
            values: rows,
        })?;
        let response = self.send(Method::POST, url, Some(body)).await?;
        let appended: AppendValuesResponse = response.json_as()?;

        Ok(AppendOutcome {
            updated_range: appended.updates.and_then(|u| u.updated_range),
        })
    }

    async fn update_cell(
        &self,
        spreadsheet_id: &str,
        cell: &CellAddress,
        value: Value,
    ) -> SheetsResult<()> {
        let range = cell.to_string();
        let mut url = self.spreadsheets_url(&[spreadsheet_id, "values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", USER_ENTERED);

        let body = serde_json::to_value(ValueRange::new(range, vec![vec![value]]))?;
        self.send(Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    async fn tab_titles(&self, spreadsheet_id: &str) -> SheetsResult<Vec<String>> {
        let mut url = self.spreadsheets_url(&[spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let response = self.send(Method::GET, url, None).await?;
        let spreadsheet: Spreadsheet = response.json_as()?;
        Ok(spreadsheet.tab_titles())
    }

    async fn create_spreadsheet(&self, title: &str, tabs: &[&str]) -> SheetsResult<String> {
        let url = self.spreadsheets_url(&[])?;
        let body = serde_json::to_value(Spreadsheet::with_tabs(title, tabs))?;
        let response = self.send(Method::POST, url, Some(body)).await?;
        let created: Spreadsheet = response.json_as()?;
        created.spreadsheet_id.ok_or_else(|| {
            SheetsError::Json("create response did not include a spreadsheetId".to_string())
        })
    }

    async fn batch_update(&self, spreadsheet_id: &str, data: Vec<ValueRange>) -> SheetsResult<()> {
        let url = self.spreadsheets_url(&[spreadsheet_id, "values:batchUpdate"])?;
        let body = serde_json::to_value(BatchUpdateValuesRequest {
            value_input_option: USER_ENTERED.to_string(),
            data,
        })?;
        self.send(Method::POST, url, Some(body)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = SheetsClientConfig::new().sheets_base_url("http://127.0.0.1:9999");
        let client = SheetsClient::new(config).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_spreadsheets_url_encodes_segments() {
        let config = SheetsClientConfig::new()
            .sheets_base_url("https://sheets.example.com")
            .api_key("AIza-test");
        let client = SheetsClient::new(config).unwrap();

        let url = client
            .spreadsheets_url(&["1AbC", "values", "'My Books'!A1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/1AbC/values/'My%20Books'!A1?key=AIza-test"
        );
    }

    #[test]
    fn test_empty_segments_leave_collection_url() {
        let client = SheetsClient::new(SheetsClientConfig::new()).unwrap();
        let url = client.spreadsheets_url(&[]).unwrap();
        assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets");
    }

    #[tokio::test]
    async fn test_user_profile_requires_token() {
        let client = SheetsClient::new(SheetsClientConfig::new()).unwrap();
        let err = client.user_profile().await.unwrap_err();
        assert!(matches!(err, SheetsError::InvalidRequest(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = SheetsClient::new(SheetsClientConfig::new().api_key("AIza-hidden")).unwrap();
        assert!(!format!("{:?}", client).contains("AIza-hidden"));
    }
}
