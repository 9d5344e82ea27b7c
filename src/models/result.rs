use chrono::{DateTime, Utc};

use crate::models::fixture::QuestionFixture;

/// 会话关闭时写入的响应占位
pub const CHAT_CLOSED_RESPONSE: &str = "CHAT_CERRADO";
/// 预算耗尽仍无回复时写入的响应占位
pub const NO_RESPONSE_RESPONSE: &str = "SIN_RESPUESTA";
/// 执行出错时写入的响应占位
pub const EXECUTION_ERROR_RESPONSE: &str = "ERROR_EJECUCION";

pub const CHAT_CLOSED_ERROR: &str = "Chat cerrado o navegador cerrado";
pub const NO_RESPONSE_ERROR: &str = "Sin respuesta del bot";
pub const CHAT_BLOCKED_ERROR: &str = "Chat bloqueado";

/// 执行出错时记录的最小耗时
const MIN_ERROR_ELAPSED_SECONDS: f64 = 0.01;

/// 单次轮询的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub response_text: String,
    pub chat_closed: bool,
    pub no_response: bool,
    pub elapsed_seconds: f64,
}

impl PollOutcome {
    pub fn candidate(response_text: String, elapsed_seconds: f64) -> Self {
        Self {
            response_text,
            chat_closed: false,
            no_response: false,
            elapsed_seconds,
        }
    }

    pub fn chat_closed(elapsed_seconds: f64) -> Self {
        Self {
            response_text: String::new(),
            chat_closed: true,
            no_response: false,
            elapsed_seconds,
        }
    }

    pub fn no_response(elapsed_seconds: f64) -> Self {
        Self {
            response_text: String::new(),
            chat_closed: false,
            no_response: true,
            elapsed_seconds,
        }
    }
}

/// 回复分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// 泄露了内部工具调用 JSON
    RawJson,
    /// 通用的"只能回答税务问题"拒答
    GenericRefusal,
    /// "找不到具体信息"样板回复
    NotFound,
    Pass,
    Fail,
}

impl Classification {
    pub fn is_pass(&self) -> bool {
        matches!(self, Classification::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::RawJson => "RAW_JSON",
            Classification::GenericRefusal => "GENERIC_REFUSAL",
            Classification::NotFound => "NOT_FOUND",
            Classification::Pass => "PASS",
            Classification::Fail => "FAIL",
        }
    }

    /// 看板依赖的最终结论文本，不要随意修改
    pub fn verdict_label(&self) -> &'static str {
        match self {
            Classification::RawJson => "FAIL (JSON)",
            Classification::GenericRefusal => "FAIL (ERROR GENÉRICO)",
            Classification::NotFound => "FAIL (NO ENCONTRADO)",
            Classification::Pass => "PASS",
            Classification::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 每道题结果都会携带的运行级标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLabels {
    pub test_type: String,
    pub environment: String,
    /// 本次运行的表格名
    pub batch_label: String,
}

/// 一道题的最终结果，创建后不再修改，按值交给各个写入端
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub question_id: String,
    pub category: String,
    pub question_text: String,
    pub expected_keywords: Vec<String>,
    /// 题库中关键词单元格的原文
    pub keywords_text: String,
    pub response_text: String,
    pub matched_keywords: Vec<String>,
    pub classification: Classification,
    pub elapsed_seconds: f64,
    pub timestamp_utc: DateTime<Utc>,
    pub error_message: Option<String>,
    pub test_type: String,
    pub environment: String,
    pub batch_label: String,
}

impl TestResult {
    /// 已分类的回复
    pub fn classified(
        fixture: &QuestionFixture,
        labels: &RunLabels,
        response_text: String,
        classification: Classification,
        matched_keywords: Vec<String>,
        elapsed_seconds: f64,
        error_message: Option<String>,
    ) -> Self {
        Self {
            question_id: fixture.id.clone(),
            category: fixture.category.clone(),
            question_text: fixture.question_text.clone(),
            expected_keywords: fixture.expected_keywords.clone(),
            keywords_text: fixture.keywords_text.clone(),
            response_text,
            matched_keywords,
            classification,
            elapsed_seconds,
            timestamp_utc: Utc::now(),
            error_message,
            test_type: labels.test_type.clone(),
            environment: labels.environment.clone(),
            batch_label: labels.batch_label.clone(),
        }
    }

    /// 没有得到可分类回复的失败结果
    fn unanswered(
        fixture: &QuestionFixture,
        labels: &RunLabels,
        response_text: &str,
        error_message: String,
        elapsed_seconds: f64,
    ) -> Self {
        Self::classified(
            fixture,
            labels,
            response_text.to_string(),
            Classification::Fail,
            Vec::new(),
            elapsed_seconds,
            Some(error_message),
        )
    }

    pub fn chat_closed(fixture: &QuestionFixture, labels: &RunLabels, elapsed_seconds: f64) -> Self {
        Self::unanswered(
            fixture,
            labels,
            CHAT_CLOSED_RESPONSE,
            CHAT_CLOSED_ERROR.to_string(),
            elapsed_seconds,
        )
    }

    pub fn no_response(fixture: &QuestionFixture, labels: &RunLabels, elapsed_seconds: f64) -> Self {
        Self::unanswered(
            fixture,
            labels,
            NO_RESPONSE_RESPONSE,
            NO_RESPONSE_ERROR.to_string(),
            elapsed_seconds,
        )
    }

    /// 执行过程出错（找不到聊天入口、会话创建失败、超时等）
    pub fn execution_error(
        fixture: &QuestionFixture,
        labels: &RunLabels,
        error_message: impl Into<String>,
        elapsed_seconds: f64,
    ) -> Self {
        Self::unanswered(
            fixture,
            labels,
            EXECUTION_ERROR_RESPONSE,
            error_message.into(),
            elapsed_seconds.max(MIN_ERROR_ELAPSED_SECONDS),
        )
    }

    pub fn is_pass(&self) -> bool {
        self.classification.is_pass()
    }

    pub fn verdict_label(&self) -> &'static str {
        self.classification.verdict_label()
    }

    pub fn matched_joined(&self) -> String {
        self.matched_keywords.join(", ")
    }
}

/// 单批次统计，仅用于日志输出
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRunSummary {
    /// 从 1 开始
    pub batch_index: usize,
    pub total_batches: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub success_rate_percent: f64,
}

impl BatchRunSummary {
    pub fn new(batch_index: usize, total_batches: usize, pass_count: usize, fail_count: usize) -> Self {
        let total = pass_count + fail_count;
        let success_rate_percent = if total == 0 {
            0.0
        } else {
            pass_count as f64 * 100.0 / total as f64
        };
        Self {
            batch_index,
            total_batches,
            pass_count,
            fail_count,
            success_rate_percent,
        }
    }

    pub fn question_count(&self) -> usize {
        self.pass_count + self.fail_count
    }
}

/// 整次运行的汇总
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub batches: Vec<BatchRunSummary>,
    pub elapsed_seconds: f64,
    /// 因任务被取消而未执行的题目数
    pub skipped: usize,
}

impl RunReport {
    pub fn pass_count(&self) -> usize {
        self.batches.iter().map(|b| b.pass_count).sum()
    }

    pub fn fail_count(&self) -> usize {
        self.batches.iter().map(|b| b.fail_count).sum()
    }

    pub fn total(&self) -> usize {
        self.pass_count() + self.fail_count()
    }
}
