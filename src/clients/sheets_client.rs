/// 电子表格 API 客户端
///
/// 封装 Sheets v4 REST 接口：读取元数据、建表、读写区域、追加行
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::SinkError;

/// 电子表格客户端
pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

impl SheetsClient {
    /// 创建新的表格客户端
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::request_failed("sheets", e))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
        })
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/v4/spreadsheets/{}", self.base_url, self.spreadsheet_id)
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/values/{}", self.spreadsheet_url(), range)
    }

    /// 获取所有工作表标题
    pub async fn sheet_titles(&self) -> Result<Vec<String>, SinkError> {
        let url = self.spreadsheet_url();
        let body = self
            .send(
                self.http.get(&url).query(&[("fields", "sheets.properties.title")]),
                &url,
            )
            .await?;

        let titles = body
            .get("sheets")
            .and_then(|v| v.as_array())
            .map(|sheets| {
                sheets
                    .iter()
                    .filter_map(|s| s.pointer("/properties/title").and_then(|t| t.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(titles)
    }

    /// 新建工作表
    pub async fn create_sheet(&self, title: &str) -> Result<(), SinkError> {
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let body = json!({
            "requests": [{
                "addSheet": { "properties": { "title": title } }
            }]
        });
        self.send(self.http.post(&url).json(&body), &url).await?;
        Ok(())
    }

    /// 读取区域
    pub async fn read_range(&self, range: &str) -> Result<Vec<Vec<Value>>, SinkError> {
        let url = self.values_url(range);
        let body = self.send(self.http.get(&url), &url).await?;
        let rows = match body.get("values") {
            Some(values) => serde_json::from_value(values.clone()).map_err(|e| SinkError::DecodeFailed {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?,
            None => Vec::new(),
        };
        Ok(rows)
    }

    /// 覆盖写入区域
    pub async fn write_range(&self, range: &str, rows: &[Vec<Value>]) -> Result<(), SinkError> {
        let url = self.values_url(range);
        let body = json!({ "values": rows });
        self.send(
            self.http
                .put(&url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
            &url,
        )
        .await?;
        Ok(())
    }

    /// 在区域末尾追加一行，并发追加由服务端串行化
    pub async fn append_row(&self, range: &str, row: &[Value]) -> Result<(), SinkError> {
        let url = format!("{}:append", self.values_url(range));
        let body = json!({ "values": [row] });
        self.send(
            self.http
                .post(&url)
                .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
                .json(&body),
            &url,
        )
        .await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Value, SinkError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SinkError::request_failed(endpoint, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SinkError::request_failed(endpoint, e))?;

        if !status.is_success() {
            return Err(SinkError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        debug!("表格 API 响应 ({}): {} 字节", endpoint, text.len());
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| SinkError::DecodeFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}
