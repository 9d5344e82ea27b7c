//! 聊天入口服务 - 业务能力层
//!
//! 负责把一个空白会话带到"问题已发出"的状态：
//! 导航 → 等待渲染 → 查找聊天按钮 → 打开聊天 → 清空旧消息 → 发送问题

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::ChatSession;
use crate::error::{SessionError, SessionResult};

pub const PAGE_SELECTOR: &str = "body";
pub const CHAT_LAUNCHER_SELECTOR: &str = "button.chat-fab";
pub const CHAT_INPUT_SELECTOR: &str = "input.message-input";

/// 主按钮没出现时依次等待的备用按钮
const LAUNCHER_WAIT_FALLBACKS: &[&str] = &["button[aria-label=\"Abrir chat\"]", "button[mat-fab]"];

/// 按优先级查找可点击的聊天按钮
const LAUNCHER_SELECTORS: &[&str] = &[
    "button.chat-fab",
    "button[aria-label=\"Abrir chat\"]",
    "button[aria-label*=\"chat\" i]",
    "button[mat-fab]",
    "button[class*=\"chat-fab\"]",
];

/// 清掉页面上已有的消息气泡
const CLEAR_BUBBLES_SCRIPT: &str = r#"
(() => {
    const bubbles = document.querySelectorAll('.message-bubble');
    bubbles.forEach(e => e.remove());
    return bubbles.length;
})()
"#;

/// 页面源码里是否带有按钮的类名，找不到按钮时写进错误信息
const LAUNCHER_MARKUP_SCRIPT: &str = r#"
(() => {
    const html = document.documentElement.outerHTML;
    return { chatFab: html.includes('chat-fab'), matFab: html.includes('mat-fab') };
})()
"#;

/// 聊天入口参数
#[derive(Debug, Clone)]
pub struct ChatSurfaceSettings {
    pub bot_url: String,
    /// 页面加载后等待前端框架渲染
    pub render_wait: Duration,
    /// 等待主聊天按钮
    pub launcher_timeout: Duration,
    /// 等待每个备用按钮
    pub fallback_launcher_timeout: Duration,
    /// 等待输入框
    pub input_timeout: Duration,
    /// 清空消息后的等待
    pub clear_wait: Duration,
    /// 找到按钮后等待其可交互
    pub interactive_wait: Duration,
    pub screenshot_dir: PathBuf,
}

impl ChatSurfaceSettings {
    pub fn new(bot_url: impl Into<String>) -> Self {
        Self {
            bot_url: bot_url.into(),
            render_wait: Duration::from_secs(5),
            launcher_timeout: Duration::from_secs(60),
            fallback_launcher_timeout: Duration::from_secs(10),
            input_timeout: Duration::from_secs(60),
            clear_wait: Duration::from_secs(1),
            interactive_wait: Duration::from_secs(1),
            screenshot_dir: PathBuf::from("test-results"),
        }
    }
}

/// 聊天入口
pub struct ChatSurface {
    settings: ChatSurfaceSettings,
}

impl ChatSurface {
    pub fn new(settings: ChatSurfaceSettings) -> Self {
        Self { settings }
    }

    /// 打开聊天窗口
    ///
    /// 所有按钮选择器都失败时保存诊断截图并返回错误，这是唯一会传给调用方的失败
    pub async fn open(&self, session: &dyn ChatSession, question_id: &str) -> SessionResult<()> {
        info!("[题目 {}] 🌐 导航到: {}", question_id, self.settings.bot_url);
        session.goto(&self.settings.bot_url).await?;
        sleep(self.settings.render_wait).await;

        self.wait_for_launcher(session, question_id).await?;
        sleep(self.settings.interactive_wait).await;

        let launcher = match self.find_visible_launcher(session).await? {
            Some(selector) => selector,
            None => {
                return Err(SessionError::ChatUnavailable(format!(
                    "No se pudo encontrar el botón del chat tras probar {} selectores. URL: {}",
                    LAUNCHER_SELECTORS.len(),
                    self.settings.bot_url
                )))
            }
        };
        debug!("[题目 {}] 聊天按钮选择器: {}", question_id, launcher);

        session.click(launcher).await?;
        info!("[题目 {}] ✅ 聊天已打开", question_id);

        session
            .wait_for_visible(CHAT_INPUT_SELECTOR, self.settings.input_timeout)
            .await?;

        session.run_script(CLEAR_BUBBLES_SCRIPT).await?;
        sleep(self.settings.clear_wait).await;
        Ok(())
    }

    /// 发送问题
    pub async fn submit(&self, session: &dyn ChatSession, question_text: &str) -> SessionResult<()> {
        session.fill_and_submit(CHAT_INPUT_SELECTOR, question_text).await
    }

    async fn wait_for_launcher(&self, session: &dyn ChatSession, question_id: &str) -> SessionResult<()> {
        info!("[题目 {}] ⏳ 等待聊天按钮渲染...", question_id);
        match session
            .wait_for_visible(CHAT_LAUNCHER_SELECTOR, self.settings.launcher_timeout)
            .await
        {
            Ok(()) => return Ok(()),
            Err(e) if e.is_closed() => return Err(e),
            Err(_) => warn!(
                "[题目 {}] ⚠️ {} 未出现，尝试其他选择器...",
                question_id, CHAT_LAUNCHER_SELECTOR
            ),
        }

        for selector in LAUNCHER_WAIT_FALLBACKS {
            match session
                .wait_for_visible(selector, self.settings.fallback_launcher_timeout)
                .await
            {
                Ok(()) => {
                    info!("[题目 {}] ✅ 通过 {} 找到按钮", question_id, selector);
                    return Ok(());
                }
                Err(e) if e.is_closed() => return Err(e),
                Err(_) => debug!("[题目 {}] {} 未出现", question_id, selector),
            }
        }

        let path = self
            .settings
            .screenshot_dir
            .join(format!("error-chat-button-{}.png", question_id));
        if let Err(e) = session.screenshot(&path).await {
            warn!("[题目 {}] 保存诊断截图失败: {}", question_id, e);
        } else {
            info!("[题目 {}] 📸 诊断截图: {}", question_id, path.display());
        }

        let (chat_fab, mat_fab) = launcher_markup(session).await;
        warn!(
            "[题目 {}] 页面源码包含 chat-fab: {}, mat-fab: {}",
            question_id, chat_fab, mat_fab
        );
        Err(SessionError::ChatUnavailable(format!(
            "No se pudo encontrar el botón del chat. HTML contiene 'chat-fab': {}, 'mat-fab': {}. URL: {}",
            chat_fab, mat_fab, self.settings.bot_url
        )))
    }

    async fn find_visible_launcher(&self, session: &dyn ChatSession) -> SessionResult<Option<&'static str>> {
        for selector in LAUNCHER_SELECTORS {
            match session.is_visible(selector).await {
                Ok(true) => return Ok(Some(*selector)),
                Ok(false) => {}
                Err(e) if e.is_closed() => return Err(e),
                Err(_) => {}
            }
        }
        Ok(None)
    }
}

/// 读取页面源码里的按钮标记，脚本失败时都按 false 处理
async fn launcher_markup(session: &dyn ChatSession) -> (bool, bool) {
    match session.run_script(LAUNCHER_MARKUP_SCRIPT).await {
        Ok(value) => {
            let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);
            (flag("chatFab"), flag("matFab"))
        }
        Err(e) => {
            debug!("读取页面源码失败: {}", e);
            (false, false)
        }
    }
}
