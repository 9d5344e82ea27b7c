//! 电子表格写入端
//!
//! 每次运行写入一个新的工作表，表头在第一次写入时按需创建

use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::clients::SheetsClient;
use crate::config::Environment;
use crate::error::SinkError;
use crate::models::result::{Classification, TestResult};
use crate::services::sink_router::{ResultSink, SinkOutcome};

/// 表头，看板和人工核对都依赖这个列顺序
pub const SHEET_HEADERS: [&str; 10] = [
    "ID",
    "Categoría",
    "Pregunta",
    "Palabras Clave Esperadas",
    "Respuesta del Bot",
    "Validación Correcta",
    "Palabras Encontradas",
    "Resultado Final",
    "Tiempo (s)",
    "Timestamp",
];

const RAW_JSON_MARKER: &str = "[ERROR JSON] ";

/// 工作表名前缀：测试类型首字母大写，再按环境加后缀
pub fn sheet_base_name(test_type: &str, environment: Environment) -> String {
    let mut chars = test_type.trim().chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => "Resultados".to_string(),
    };
    format!("{}{}", capitalized, environment.sheet_suffix())
}

/// 生成本次运行唯一的工作表名：`<base>_<YYYYMMDD>_<HHMMSS>_<毫秒>_<微秒尾数>`
pub fn generate_sheet_name(base: &str, now: DateTime<Local>) -> String {
    let micros_tail = now.timestamp_subsec_micros() % 1000;
    format!(
        "{}_{}_{:03}_{:03}",
        base,
        now.format("%Y%m%d_%H%M%S"),
        now.timestamp_subsec_millis(),
        micros_tail
    )
}

/// 把结果转换为一行表格数据
pub fn sheet_row(result: &TestResult) -> Vec<Value> {
    let response = if result.classification == Classification::RawJson {
        format!("{}{}", RAW_JSON_MARKER, result.response_text)
    } else {
        result.response_text.clone()
    };
    vec![
        json!(result.question_id),
        json!(result.category),
        json!(result.question_text),
        json!(result.keywords_text),
        json!(response),
        json!(result.is_pass()),
        json!(result.matched_joined()),
        json!(result.verdict_label()),
        json!(format!("{:.2}", result.elapsed_seconds)),
        json!(result.timestamp_utc.to_rfc3339_opts(SecondsFormat::Millis, true)),
    ]
}

/// 电子表格写入端
pub struct SpreadsheetSink {
    client: Option<SheetsClient>,
    sheet_name: String,
    schema_ready: OnceCell<bool>,
}

impl SpreadsheetSink {
    pub fn new(client: SheetsClient, sheet_name: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            sheet_name: sheet_name.into(),
            schema_ready: OnceCell::new(),
        }
    }

    /// 缺少凭据时使用：所有写入都是空操作
    pub fn disabled(sheet_name: impl Into<String>) -> Self {
        Self {
            client: None,
            sheet_name: sheet_name.into(),
            schema_ready: OnceCell::new(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// 工作表不存在则创建，表头为空则写入
    async fn ensure_schema(&self, client: &SheetsClient) -> Result<(), SinkError> {
        let titles = client.sheet_titles().await?;
        if !titles.iter().any(|t| t == &self.sheet_name) {
            info!("📝 创建新工作表: \"{}\"", self.sheet_name);
            client.create_sheet(&self.sheet_name).await?;
        }

        let header_range = format!("{}!A1:J1", self.sheet_name);
        let existing = client.read_range(&header_range).await?;
        if existing.is_empty() {
            let headers: Vec<Value> = SHEET_HEADERS.iter().map(|h| json!(h)).collect();
            client.write_range(&header_range, &[headers]).await?;
            info!("✅ 已在工作表 \"{}\" 写入表头", self.sheet_name);
        }
        Ok(())
    }

    async fn append(&self, client: &SheetsClient, result: &TestResult) -> Result<(), SinkError> {
        self.schema_ready
            .get_or_init(|| async {
                match self.ensure_schema(client).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("⚠️ 检查/创建表头失败: {}", e);
                        false
                    }
                }
            })
            .await;

        let range = format!("{}!A1", self.sheet_name);
        client.append_row(&range, &sheet_row(result)).await
    }
}

#[async_trait]
impl ResultSink for SpreadsheetSink {
    fn name(&self) -> &'static str {
        "电子表格"
    }

    async fn deliver(&self, result: &TestResult) -> SinkOutcome {
        let Some(client) = &self.client else {
            return SinkOutcome::Skipped;
        };
        match self.append(client, result).await {
            Ok(()) => SinkOutcome::Delivered,
            Err(e) => {
                warn!("[题目 {}] 无法写入表格: {}", result.question_id, e);
                SinkOutcome::Failed
            }
        }
    }
}
