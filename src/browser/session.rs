//! 浏览器会话能力
//!
//! 核心流程只依赖这里的 trait，不关心底层是 CDP 还是测试替身

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};

use crate::error::{SessionError, SessionResult};

/// 等待元素时的检查间隔
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 一个独占的浏览器会话（一个隔离上下文中的一个页面）
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// 导航到指定地址
    async fn goto(&self, url: &str) -> SessionResult<()>;

    /// 选择器命中的第一个元素是否可见
    async fn is_visible(&self, selector: &str) -> SessionResult<bool>;

    /// 选择器命中的所有元素的文本
    async fn text_contents(&self, selector: &str) -> SessionResult<Vec<String>>;

    async fn click(&self, selector: &str) -> SessionResult<()>;

    /// 在输入框中输入文本并回车
    async fn fill_and_submit(&self, selector: &str, text: &str) -> SessionResult<()>;

    /// 注入一段脚本并返回结果
    async fn run_script(&self, script: &str) -> SessionResult<JsonValue>;

    /// 保存整页截图（诊断用）
    async fn screenshot(&self, path: &Path) -> SessionResult<()>;

    /// 关闭页面并释放隔离上下文
    async fn close(&self) -> SessionResult<()>;

    /// 等待元素可见，超时返回 [`SessionError::Timeout`]
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> SessionResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.is_visible(selector).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) if e.is_closed() => return Err(e),
                Err(_) => {}
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Timeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

/// 为每道题创建独立会话
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> SessionResult<Arc<dyn ChatSession>>;
}
