//! 题目处理上下文
//!
//! 封装"我正在处理第几批的哪道题"这一信息

use std::fmt::Display;

/// 题目处理上下文
///
/// 只用于日志前缀，不参与任何判断
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 批次编号（从1开始）
    pub batch_index: usize,

    /// 批次总数
    pub total_batches: usize,

    /// 题目在整个题目集中的位置（从1开始）
    pub position: usize,

    /// 题目ID
    pub question_id: String,
}

impl QuestionCtx {
    /// 创建新的题目上下文
    pub fn new(
        batch_index: usize,
        total_batches: usize,
        position: usize,
        question_id: impl Into<String>,
    ) -> Self {
        Self {
            batch_index,
            total_batches,
            position,
            question_id: question_id.into(),
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[批次 {}/{} 题目#{} ID#{}]",
            self.batch_index, self.total_batches, self.position, self.question_id
        )
    }
}
