//! 结果分发 - 业务能力层
//!
//! 每道题的结果同时交给表格端和结果库端：
//! - 两端独立尝试，互不取消
//! - 任何失败只记录日志，不会中断运行

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::result::TestResult;

/// 单个写入端的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    Delivered,
    Failed,
    /// 写入端未启用
    Skipped,
}

impl SinkOutcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            SinkOutcome::Delivered
        } else {
            SinkOutcome::Failed
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, SinkOutcome::Delivered)
    }
}

/// 结果写入端
#[async_trait]
pub trait ResultSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// 投递一条结果；实现方必须自行吞掉所有错误
    async fn deliver(&self, result: &TestResult) -> SinkOutcome;
}

/// 两个写入端各自的投递结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkReport {
    pub spreadsheet: SinkOutcome,
    pub database: SinkOutcome,
}

/// 结果分发器
pub struct SinkRouter {
    spreadsheet: Arc<dyn ResultSink>,
    database: Arc<dyn ResultSink>,
}

impl SinkRouter {
    pub fn new(spreadsheet: Arc<dyn ResultSink>, database: Arc<dyn ResultSink>) -> Self {
        Self {
            spreadsheet,
            database,
        }
    }

    /// 并发投递到两个写入端，等待两者都结束
    pub async fn deliver(&self, result: &TestResult) -> SinkReport {
        let (spreadsheet, database) =
            tokio::join!(self.spreadsheet.deliver(result), self.database.deliver(result));

        log_outcome(&result.question_id, self.spreadsheet.name(), spreadsheet);
        log_outcome(&result.question_id, self.database.name(), database);

        SinkReport {
            spreadsheet,
            database,
        }
    }
}

fn log_outcome(question_id: &str, sink: &str, outcome: SinkOutcome) {
    match outcome {
        SinkOutcome::Delivered => info!("[题目 {}] 💾 已写入{}", question_id, sink),
        SinkOutcome::Failed => warn!("[题目 {}] ⚠️ 写入{}失败", question_id, sink),
        SinkOutcome::Skipped => info!("[题目 {}] 📝 {}未启用，跳过", question_id, sink),
    }
}
