/// 结果库 API 客户端
///
/// 把一道题的结果以结果库的字段名提交到 `POST /api/results`
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::SinkError;
use crate::models::result::TestResult;

/// 结果库的字段结构，看板直接读取这些字段
#[derive(Debug, Serialize)]
pub struct StoredResultPayload<'a> {
    pub test_id: &'a str,
    pub categoria: &'a str,
    pub pregunta: &'a str,
    pub palabras_clave: &'a str,
    pub respuesta_bot: &'a str,
    pub validacion_correcta: bool,
    pub palabras_encontradas: String,
    pub resultado_final: &'a str,
    pub tiempo_segundos: f64,
    pub error: Option<&'a str>,
    pub test_type: &'a str,
    pub environment: &'a str,
    pub sheet_name: Option<&'a str>,
}

impl<'a> From<&'a TestResult> for StoredResultPayload<'a> {
    fn from(result: &'a TestResult) -> Self {
        Self {
            test_id: &result.question_id,
            categoria: &result.category,
            pregunta: &result.question_text,
            palabras_clave: &result.keywords_text,
            respuesta_bot: &result.response_text,
            validacion_correcta: result.is_pass(),
            palabras_encontradas: result.matched_joined(),
            resultado_final: result.verdict_label(),
            tiempo_segundos: (result.elapsed_seconds * 100.0).round() / 100.0,
            error: result.error_message.as_deref(),
            test_type: &result.test_type,
            environment: &result.environment,
            sheet_name: Some(result.batch_label.as_str()).filter(|s| !s.is_empty()),
        }
    }
}

/// 结果库客户端
pub struct ResultStoreClient {
    http: Client,
    endpoint: String,
}

impl ResultStoreClient {
    /// `api_url` 为服务根地址，如 `http://localhost:8000`
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, SinkError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::request_failed("result-store", e))?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/results", api_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 提交结果，返回服务端分配的 ID
    pub async fn submit(&self, result: &TestResult) -> Result<Value, SinkError> {
        let payload = StoredResultPayload::from(result);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SinkError::request_failed(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::BadStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|e| SinkError::DecodeFailed {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        Ok(body.get("id").cloned().unwrap_or(Value::Null))
    }
}
