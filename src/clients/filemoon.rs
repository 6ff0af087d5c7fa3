use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{CatalogSource, ClientError};
use crate::config::CatalogConfig;
use crate::models::HostedFileRecord;

const AUTH_FAILURE_MSG: &str = "Wrong Auth";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    msg: String,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    result: Option<ListResult>,
}

#[derive(Debug, Deserialize)]
struct ListResult {
    #[serde(default)]
    files: Vec<ApiFile>,
}

/// The API is loose about types: sizes and flags arrive as numbers or strings.
#[derive(Debug, Deserialize)]
struct ApiFile {
    #[serde(default)]
    file_code: Value,
    #[serde(default)]
    title: Value,
    #[serde(default)]
    file_size: Value,
    #[serde(default)]
    uploaded: Value,
    #[serde(default)]
    status: Value,
    #[serde(default)]
    public: Value,
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

impl From<ApiFile> for HostedFileRecord {
    fn from(file: ApiFile) -> Self {
        Self {
            file_code: text(&file.file_code),
            title: text(&file.title),
            file_size: text(&file.file_size),
            uploaded: text(&file.uploaded),
            status: text(&file.status),
            public: text(&file.public),
        }
    }
}

/// Decodes a `file/list` response body.
///
/// A body without a `result.files` list is treated as an empty page.
pub(crate) fn parse_list_response(body: &str) -> Result<Vec<HostedFileRecord>, ClientError> {
    let response: ListResponse =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    if response.msg.eq_ignore_ascii_case(AUTH_FAILURE_MSG) {
        return Err(ClientError::Auth);
    }

    let status = response.status.as_ref().and_then(Value::as_i64);
    if let Some(code) = status
        && code != 200
        && response.result.is_none()
    {
        return Err(ClientError::Api(format!("status {code}: {}", response.msg)));
    }

    Ok(response
        .result
        .map(|r| r.files.into_iter().map(HostedFileRecord::from).collect())
        .unwrap_or_default())
}

#[derive(Clone)]
pub struct FileMoonClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FileMoonClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Moonarr/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Builds a client from the `[catalog]` section and the resolved API key.
    pub fn from_config(config: &CatalogConfig, api_key: Option<&str>) -> Result<Self, ClientError> {
        Self::new(
            config.api_base_url.clone(),
            api_key.ok_or(ClientError::MissingApiKey)?,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    fn list_url(&self, page: u32, per_page: u32) -> Result<Url, ClientError> {
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };
        let mut url = Url::parse(&base)
            .and_then(|u| u.join("file/list"))
            .map_err(|e| ClientError::Http(format!("Invalid API base URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

#[async_trait::async_trait]
impl CatalogSource for FileMoonClient {
    async fn list_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<HostedFileRecord>, ClientError> {
        let url = self.list_url(page, per_page)?;
        debug!(page, per_page, "Requesting hosted file list");

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_list_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_value_types() {
        let body = r#"{"msg":"OK","status":200,"result":{"files":[
            {"file_code":"abc","title":"Show_S01E01","file_size":1048576,"uploaded":"2024-01-01 10:00:00","status":200,"public":1},
            {"file_code":"def","title":"Show_S01E02"}
        ]}}"#;
        let rows = parse_list_response(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].file_size, "1048576");
        assert_eq!(rows[0].public, "1");
        assert_eq!(rows[1].uploaded, "");
    }

    #[test]
    fn wrong_auth_is_an_auth_error() {
        let body = r#"{"msg":"Wrong Auth","status":403}"#;
        assert!(matches!(parse_list_response(body), Err(ClientError::Auth)));
    }

    #[test]
    fn missing_result_is_an_empty_page() {
        assert!(parse_list_response(r#"{"msg":"OK","status":200}"#).unwrap().is_empty());
        assert!(matches!(
            parse_list_response(r#"{"msg":"Server busy","status":500}"#),
            Err(ClientError::Api(_))
        ));
        assert!(matches!(parse_list_response("<html>"), Err(ClientError::Decode(_))));
    }

    #[test]
    fn list_url_carries_paging() {
        let client = FileMoonClient::new(
            "https://filemoonapi.com/api",
            "secret",
            Duration::from_secs(5),
        )
        .unwrap();
        let url = client.list_url(3, 100).unwrap();
        assert_eq!(
            url.as_str(),
            "https://filemoonapi.com/api/file/list?key=secret&per_page=100&page=3"
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            FileMoonClient::new("https://filemoonapi.com/api/", " ", Duration::from_secs(5)),
            Err(ClientError::MissingApiKey)
        ));
    }
}
