//! # Chat QA Runner
//!
//! 对网页聊天机器人做批量问答测试的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动或连接浏览器，每道题一个隔离上下文
//! - `infrastructure/` - `JsExecutor`，会话内唯一的 page owner，提供 eval() 能力
//! - `clients/` - 电子表格和结果库的 HTTP 客户端
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个题目
//! - `ChatSurface` - 打开聊天窗口、发送问题
//! - `ResponsePoller` - 轮询机器人回复（显式状态机）
//! - `ResponseClassifier` - 有序规则分类（纯函数）
//! - `SinkRouter` - 把结果同时交给表格端和结果库端
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（批次 + 题目）
//! - `QuestionFlow` - 流程编排（打开 → 提问 → 轮询 → 分类）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 应用入口，管理资源
//! - `orchestrator/batch_scheduler` - 批内并发、批间冷却
//! - `orchestrator/job_registry` - 单槽任务登记
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{BrowserHandle, ChatSession, SessionFactory};
pub use config::{Config, Environment};
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{Classification, FixtureSet, QuestionFixture, TestResult};
pub use orchestrator::{App, BatchScheduler, JobRegistry};
pub use services::{classify, ResponsePoller, SinkRouter};
pub use workflow::{QuestionCtx, QuestionFlow, QuestionProcessor};
