//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 管理应用生命周期（初始化、运行、清理）
//! - 持有浏览器和两个结果写入端
//! - 输出全局统计信息
//!
//! ### `batch_scheduler` - 批次调度器
//! - 切分批次，批内并发、批间冷却
//! - 每道题独占会话，结束后统一关闭
//! - 把单题失败转换为 FAIL 结果
//!
//! ### `job_registry` - 单槽任务登记表
//! - 同时只允许一个运行，支持带外取消
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (App)
//!     ↓
//! batch_scheduler (处理 Vec<QuestionFixture>)
//!     ↓
//! workflow::QuestionFlow (处理单个题目)
//!     ↓
//! services (能力层：chat_surface / poller / classifier / sinks)
//!     ↓
//! browser + infrastructure (会话与 JsExecutor)
//! ```

pub mod batch_processor;
pub mod batch_scheduler;
pub mod job_registry;

// 重新导出主要类型
pub use batch_processor::App;
pub use batch_scheduler::{BatchScheduler, SchedulerSettings};
pub use job_registry::{JobRegistry, JobStatus, JobTicket};
