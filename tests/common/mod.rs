//! 测试替身：脚本化的会话、会话工厂和记录型写入端
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_qa_runner::browser::{ChatSession, SessionFactory};
use chat_qa_runner::error::{SessionError, SessionResult};
use chat_qa_runner::models::result::RunLabels;
use chat_qa_runner::models::{QuestionFixture, TestResult};
use chat_qa_runner::services::{ResultSink, SinkOutcome};
use serde_json::{json, Value as JsonValue};

pub const BOT_BUBBLE: &str = ".message-bubble.bot";
pub const LAUNCHER: &str = "button.chat-fab";
pub const INPUT: &str = "input.message-input";

/// 按脚本响应的会话
#[derive(Default)]
pub struct FakeSession {
    visible: Mutex<HashSet<String>>,
    bot_messages: Mutex<Vec<String>>,
    other_messages: Mutex<HashMap<String, Vec<String>>>,
    reply: Option<String>,
    markup: Option<JsonValue>,
    close_on_submit: bool,
    broken: AtomicBool,
    pub closed: AtomicBool,
    pub text_reads: AtomicUsize,
    pub submitted: Mutex<Vec<String>>,
    pub screenshots: Mutex<Vec<PathBuf>>,
}

impl FakeSession {
    fn with_visible(selectors: &[&str]) -> Self {
        Self {
            visible: Mutex::new(selectors.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    /// 聊天正常，发送问题后立即出现回复
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::with_visible(&["body", LAUNCHER, INPUT])
        }
    }

    /// 聊天正常，但机器人从不回复
    pub fn silent() -> Self {
        Self::with_visible(&["body", LAUNCHER, INPUT])
    }

    /// 页面上找不到任何聊天按钮
    pub fn without_launcher() -> Self {
        Self::with_visible(&["body"])
    }

    /// 发送问题后页面被关闭
    pub fn closing_after_submit() -> Self {
        Self {
            close_on_submit: true,
            ..Self::silent()
        }
    }

    pub fn with_messages(self, messages: &[&str]) -> Self {
        *self.bot_messages.lock().unwrap() = messages.iter().map(|m| m.to_string()).collect();
        self
    }

    /// 消息只挂在指定选择器下（主选择器之外的页面结构）
    pub fn with_messages_at(self, selector: &str, messages: &[&str]) -> Self {
        self.other_messages.lock().unwrap().insert(
            selector.to_string(),
            messages.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    /// 页面源码检查脚本的返回值
    pub fn with_markup(self, chat_fab: bool, mat_fab: bool) -> Self {
        Self {
            markup: Some(json!({ "chatFab": chat_fab, "matFab": mat_fab })),
            ..self
        }
    }

    pub fn hide(&self, selector: &str) {
        self.visible.lock().unwrap().remove(selector);
    }

    pub fn break_session(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check(&self) -> SessionResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(SessionError::Closed("Target closed".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatSession for FakeSession {
    async fn goto(&self, _url: &str) -> SessionResult<()> {
        self.check()
    }

    async fn is_visible(&self, selector: &str) -> SessionResult<bool> {
        self.check()?;
        Ok(self.visible.lock().unwrap().contains(selector))
    }

    async fn text_contents(&self, selector: &str) -> SessionResult<Vec<String>> {
        self.check()?;
        self.text_reads.fetch_add(1, Ordering::SeqCst);
        if selector == BOT_BUBBLE {
            Ok(self.bot_messages.lock().unwrap().clone())
        } else {
            Ok(self
                .other_messages
                .lock()
                .unwrap()
                .get(selector)
                .cloned()
                .unwrap_or_default())
        }
    }

    async fn click(&self, selector: &str) -> SessionResult<()> {
        self.check()?;
        if self.visible.lock().unwrap().contains(selector) {
            Ok(())
        } else {
            Err(SessionError::ElementNotFound(selector.to_string()))
        }
    }

    async fn fill_and_submit(&self, _selector: &str, text: &str) -> SessionResult<()> {
        self.check()?;
        self.submitted.lock().unwrap().push(text.to_string());
        if let Some(reply) = &self.reply {
            self.bot_messages.lock().unwrap().push(reply.clone());
        }
        if self.close_on_submit {
            self.break_session();
        }
        Ok(())
    }

    async fn run_script(&self, script: &str) -> SessionResult<JsonValue> {
        self.check()?;
        match &self.markup {
            Some(markup) if script.contains("outerHTML") => Ok(markup.clone()),
            _ => Ok(json!(0)),
        }
    }

    async fn screenshot(&self, path: &Path) -> SessionResult<()> {
        self.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> SessionResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// 每次打开会话都调用构造函数，并记住所有创建过的会话
pub struct FakeFactory {
    make: Box<dyn Fn() -> FakeSession + Send + Sync>,
    pub opened: Mutex<Vec<Arc<FakeSession>>>,
}

impl FakeFactory {
    pub fn new(make: impl Fn() -> FakeSession + Send + Sync + 'static) -> Self {
        Self {
            make: Box::new(make),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn sessions(&self) -> Vec<Arc<FakeSession>> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open_session(&self) -> SessionResult<Arc<dyn ChatSession>> {
        let session = Arc::new((self.make)());
        self.opened.lock().unwrap().push(session.clone());
        Ok(session)
    }
}

/// 记录收到的所有结果，返回固定的投递结果
pub struct RecordingSink {
    outcome: SinkOutcome,
    pub received: Mutex<Vec<TestResult>>,
}

impl RecordingSink {
    pub fn new(outcome: SinkOutcome) -> Self {
        Self {
            outcome,
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn results(&self) -> Vec<TestResult> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, result: &TestResult) -> SinkOutcome {
        self.received.lock().unwrap().push(result.clone());
        self.outcome
    }
}

pub fn labels() -> RunLabels {
    RunLabels {
        test_type: "inmobiliario".to_string(),
        environment: "preprod".to_string(),
        batch_label: "Inmobiliario_Preprod_20250307_090501_042_017".to_string(),
    }
}

pub fn fixture(id: &str, question: &str, keywords: &[&str]) -> QuestionFixture {
    QuestionFixture {
        id: id.to_string(),
        category: "Inmobiliario".to_string(),
        question_text: question.to_string(),
        expected_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        keywords_text: keywords.join(", "),
    }
}
