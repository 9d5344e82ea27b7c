//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 打开聊天入口（失败即为本题的执行错误）
//! 2. 发送问题
//! 3. 轮询回复
//! 4. 分类并生成结果

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::browser::ChatSession;
use crate::config::Config;
use crate::models::fixture::QuestionFixture;
use crate::models::result::{RunLabels, TestResult, CHAT_BLOCKED_ERROR};
use crate::services::{ChatSurface, ChatSurfaceSettings, PollerSettings, ResponseClassifier, ResponsePoller};
use crate::utils::logging::truncate_text;
use crate::workflow::question_ctx::QuestionCtx;

/// 机器人拒绝处理消息时的固定回复
const CHAT_BLOCKED_MARKER: &str = "Lo siento, no puedo procesar tu mensaje";

/// 单道题的处理能力
///
/// 调度器只依赖这个 trait，测试中可以替换为桩实现
#[async_trait]
pub trait QuestionProcessor: Send + Sync {
    /// 处理一道题；任何失败都体现在返回的结果里
    async fn process(
        &self,
        fixture: &QuestionFixture,
        session: &dyn ChatSession,
        ctx: &QuestionCtx,
    ) -> TestResult;

    /// 写入每条结果的运行级标签
    fn labels(&self) -> &RunLabels;
}

/// 题目处理流程
///
/// - 编排"打开聊天 → 提问 → 轮询 → 分类"
/// - 不持有任何会话，会话由调度器按题分配
pub struct QuestionFlow {
    surface: ChatSurface,
    poller: ResponsePoller,
    classifier: ResponseClassifier,
    labels: RunLabels,
}

impl QuestionFlow {
    pub fn new(surface: ChatSurface, poller: ResponsePoller, labels: RunLabels) -> Self {
        Self {
            surface,
            poller,
            classifier: ResponseClassifier::new(),
            labels,
        }
    }

    /// 按配置创建
    pub fn from_config(config: &Config, labels: RunLabels) -> Self {
        let surface = ChatSurface::new(ChatSurfaceSettings {
            render_wait: Duration::from_millis(config.render_wait_ms),
            launcher_timeout: Duration::from_secs(config.launcher_timeout_secs),
            input_timeout: Duration::from_secs(config.input_timeout_secs),
            screenshot_dir: config.screenshot_dir.clone().into(),
            ..ChatSurfaceSettings::new(config.bot_url.clone())
        });
        let poller = ResponsePoller::new(PollerSettings {
            attempts: config.poll_attempts,
            interval: config.poll_interval(),
            settle: config.poll_settle(),
        });
        Self::new(surface, poller, labels)
    }

    fn classify_reply(
        &self,
        fixture: &QuestionFixture,
        response_text: String,
        elapsed_seconds: f64,
        ctx: &QuestionCtx,
    ) -> TestResult {
        let outcome = self
            .classifier
            .classify(&response_text, &fixture.expected_keywords);

        let error_message = if response_text.contains(CHAT_BLOCKED_MARKER) {
            warn!("{} ⚠️ 聊天被机器人拦截", ctx);
            Some(CHAT_BLOCKED_ERROR.to_string())
        } else {
            None
        };

        if outcome.classification.is_pass() {
            info!(
                "{} ✅ {} (匹配: {})",
                ctx,
                outcome.classification.verdict_label(),
                outcome.matched_keywords.join(", ")
            );
        } else {
            info!(
                "{} ❌ {}: \"{}\"",
                ctx,
                outcome.classification.verdict_label(),
                truncate_text(&response_text, 80)
            );
        }

        TestResult::classified(
            fixture,
            &self.labels,
            response_text,
            outcome.classification,
            outcome.matched_keywords,
            elapsed_seconds,
            error_message,
        )
    }
}

#[async_trait]
impl QuestionProcessor for QuestionFlow {
    async fn process(
        &self,
        fixture: &QuestionFixture,
        session: &dyn ChatSession,
        ctx: &QuestionCtx,
    ) -> TestResult {
        let setup_started = Instant::now();
        info!("{} 📝 {}", ctx, truncate_text(&fixture.question_text, 60));

        if let Err(e) = self.surface.open(session, &fixture.id).await {
            error!("{} ❌ 无法打开聊天: {}", ctx, e);
            return TestResult::execution_error(
                fixture,
                &self.labels,
                e.to_string(),
                setup_started.elapsed().as_secs_f64(),
            );
        }

        let started = Instant::now();
        if let Err(e) = self.surface.submit(session, &fixture.question_text).await {
            error!("{} ❌ 发送问题失败: {}", ctx, e);
            return TestResult::execution_error(
                fixture,
                &self.labels,
                e.to_string(),
                started.elapsed().as_secs_f64(),
            );
        }
        info!("{} 📤 问题已发送，等待回复...", ctx);

        let outcome = self.poller.poll(session, &fixture.id).await;
        let elapsed = started.elapsed().as_secs_f64();

        if outcome.chat_closed {
            return TestResult::chat_closed(fixture, &self.labels, elapsed);
        }
        if outcome.no_response {
            return TestResult::no_response(fixture, &self.labels, elapsed);
        }
        self.classify_reply(fixture, outcome.response_text, elapsed, ctx)
    }

    fn labels(&self) -> &RunLabels {
        &self.labels
    }
}
