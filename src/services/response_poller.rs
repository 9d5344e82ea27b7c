//! 回复轮询服务 - 业务能力层
//!
//! 问题发出后，按固定次数和间隔采样页面，直到拿到稳定的机器人回复。
//! 轮询是一个显式状态机：
//!
//! ```text
//! WAITING ──(候选回复)──▶ CANDIDATE_FOUND
//!    │    ──(会话关闭)──▶ CHAT_CLOSED
//!    └────(预算耗尽)──▶ EXHAUSTED
//! ```
//!
//! 轮询器从不向外返回错误：页面层的任何错误都视为会话已关闭。

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::browser::ChatSession;
use crate::error::SessionResult;
use crate::models::result::PollOutcome;
use crate::services::chat_surface::{CHAT_INPUT_SELECTOR, CHAT_LAUNCHER_SELECTOR, PAGE_SELECTOR};
use crate::services::classifier::{strip_response_prefix, MIN_RESPONSE_CHARS};
use crate::utils::logging::truncate_text;

/// 机器人消息的主选择器
pub const BOT_MESSAGE_SELECTOR: &str = ".message-bubble.bot";

/// 主选择器找不到回复时依次尝试的备用选择器
pub const FALLBACK_MESSAGE_SELECTORS: &[&str] = &[
    ".bot-message",
    ".chat-message.bot",
    ".message.bot",
    "[data-testid=\"bot-message\"]",
    ".response",
];

/// 轮询参数
#[derive(Debug, Clone, Copy)]
pub struct PollerSettings {
    /// 最大尝试次数
    pub attempts: usize,
    /// 每次尝试前的等待
    pub interval: Duration,
    /// 发现消息后再等一会儿，确保消息渲染完整
    pub settle: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            attempts: 15,
            interval: Duration::from_secs(5),
            settle: Duration::from_millis(500),
        }
    }
}

/// 单次采样观察到的情况
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptObservation {
    Candidate(String),
    SessionClosed,
    Nothing,
}

/// 轮询状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// 已完成 `attempt` 次尝试
    Waiting { attempt: usize },
    CandidateFound(String),
    ChatClosed,
    Exhausted,
}

impl PollState {
    pub fn start(max_attempts: usize) -> Self {
        if max_attempts == 0 {
            PollState::Exhausted
        } else {
            PollState::Waiting { attempt: 0 }
        }
    }

    /// 根据一次观察推进状态；终态保持不变
    pub fn advance(self, observation: AttemptObservation, max_attempts: usize) -> Self {
        match self {
            PollState::Waiting { attempt } => {
                let attempt = attempt + 1;
                match observation {
                    AttemptObservation::Candidate(text) => PollState::CandidateFound(text),
                    AttemptObservation::SessionClosed => PollState::ChatClosed,
                    AttemptObservation::Nothing if attempt >= max_attempts => PollState::Exhausted,
                    AttemptObservation::Nothing => PollState::Waiting { attempt },
                }
            }
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Waiting { .. })
    }
}

/// 从一组消息文本中取最后一条，去掉前缀后足够长才算候选回复
pub fn last_candidate(messages: &[String]) -> Option<String> {
    let last = messages.last()?.trim();
    let text = strip_response_prefix(last);
    if text.chars().count() >= MIN_RESPONSE_CHARS {
        Some(text.to_string())
    } else {
        None
    }
}

/// 回复轮询器
pub struct ResponsePoller {
    settings: PollerSettings,
}

impl ResponsePoller {
    pub fn new(settings: PollerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }

    /// 轮询机器人回复
    ///
    /// 找到候选回复立即返回，不会等完剩余预算
    pub async fn poll(&self, session: &dyn ChatSession, question_id: &str) -> PollOutcome {
        let started = Instant::now();
        let max_attempts = self.settings.attempts;
        let mut state = PollState::start(max_attempts);
        let mut attempt = 0;

        while !state.is_terminal() {
            sleep(self.settings.interval).await;
            attempt += 1;
            let observation = self.observe(session, question_id, attempt).await;
            state = state.advance(observation, max_attempts);
        }

        let elapsed = started.elapsed().as_secs_f64();
        match state {
            PollState::CandidateFound(text) => {
                info!(
                    "[题目 {}] 📥 第 {} 次尝试拿到回复: \"{}\"",
                    question_id,
                    attempt,
                    truncate_text(&text, 80)
                );
                PollOutcome::candidate(text, elapsed)
            }
            PollState::ChatClosed => {
                warn!("[题目 {}] ⚠️ 聊天已关闭 (第 {} 次尝试)", question_id, attempt);
                PollOutcome::chat_closed(elapsed)
            }
            _ => {
                warn!(
                    "[题目 {}] ⚠️ {} 次尝试后仍无回复",
                    question_id, max_attempts
                );
                PollOutcome::no_response(elapsed)
            }
        }
    }

    async fn observe(
        &self,
        session: &dyn ChatSession,
        question_id: &str,
        attempt: usize,
    ) -> AttemptObservation {
        match self.try_observe(session, question_id, attempt).await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(
                    "[题目 {}] ⚠️ 第 {} 次尝试出错，视为会话关闭: {}",
                    question_id, attempt, e
                );
                AttemptObservation::SessionClosed
            }
        }
    }

    async fn try_observe(
        &self,
        session: &dyn ChatSession,
        question_id: &str,
        attempt: usize,
    ) -> SessionResult<AttemptObservation> {
        if !session.is_visible(PAGE_SELECTOR).await? {
            warn!("[题目 {}] ⚠️ 页面不可见", question_id);
            return Ok(AttemptObservation::SessionClosed);
        }

        let launcher_visible = session.is_visible(CHAT_LAUNCHER_SELECTOR).await?;
        let input_visible = session.is_visible(CHAT_INPUT_SELECTOR).await?;
        if !launcher_visible && !input_visible {
            return Ok(AttemptObservation::SessionClosed);
        }

        let messages = session.text_contents(BOT_MESSAGE_SELECTOR).await?;
        debug!(
            "[题目 {}] 🔍 第 {}/{} 次尝试: 找到 {} 条机器人消息",
            question_id,
            attempt,
            self.settings.attempts,
            messages.len()
        );

        if !messages.is_empty() {
            sleep(self.settings.settle).await;
            let refreshed = session.text_contents(BOT_MESSAGE_SELECTOR).await?;
            if let Some(text) = last_candidate(&refreshed) {
                return Ok(AttemptObservation::Candidate(text));
            }
        }

        for selector in FALLBACK_MESSAGE_SELECTORS {
            let messages = session.text_contents(selector).await?;
            if let Some(text) = last_candidate(&messages) {
                debug!("[题目 {}] 备用选择器 {} 命中", question_id, selector);
                return Ok(AttemptObservation::Candidate(text));
            }
        }

        Ok(AttemptObservation::Nothing)
    }
}
