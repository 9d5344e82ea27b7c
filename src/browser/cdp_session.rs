//! 基于 chromiumoxide 的会话实现
//!
//! 每个会话使用独立的浏览器上下文（cookie、存储互不共享）

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Browser;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::browser::session::{ChatSession, SessionFactory};
use crate::error::{SessionError, SessionResult};
use crate::infrastructure::js_executor::{
    clear_input_script, text_contents_script, visibility_script, JsExecutor,
};

/// CDP 会话
pub struct CdpSession {
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    executor: JsExecutor,
}

#[async_trait]
impl ChatSession for CdpSession {
    async fn goto(&self, url: &str) -> SessionResult<()> {
        debug!("导航到: {}", url);
        self.executor.page().goto(url).await?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> SessionResult<bool> {
        self.executor.eval_as(visibility_script(selector)?).await
    }

    async fn text_contents(&self, selector: &str) -> SessionResult<Vec<String>> {
        self.executor.eval_as(text_contents_script(selector)?).await
    }

    async fn click(&self, selector: &str) -> SessionResult<()> {
        let element = self
            .executor
            .page()
            .find_element(selector)
            .await
            .map_err(|_| SessionError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        Ok(())
    }

    async fn fill_and_submit(&self, selector: &str, text: &str) -> SessionResult<()> {
        self.executor.eval(clear_input_script(selector)?).await?;
        let element = self
            .executor
            .page()
            .find_element(selector)
            .await
            .map_err(|_| SessionError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        element.type_str(text).await?;
        element.press_key("Enter").await?;
        Ok(())
    }

    async fn run_script(&self, script: &str) -> SessionResult<JsonValue> {
        self.executor.eval(script).await
    }

    async fn screenshot(&self, path: &Path) -> SessionResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.executor
            .page()
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await?;
        Ok(())
    }

    async fn close(&self) -> SessionResult<()> {
        // 页面可能已经随上下文一起消失，关闭失败只记录
        if let Err(e) = self.executor.page().clone().close().await {
            warn!("关闭页面失败: {}", e);
        }
        self.browser
            .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
            .await?;
        debug!("浏览器上下文已释放: {:?}", self.context_id);
        Ok(())
    }
}

/// 在同一个浏览器中为每道题开一个隔离上下文
pub struct CdpSessionFactory {
    browser: Arc<Browser>,
}

impl CdpSessionFactory {
    pub fn new(browser: Arc<Browser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl SessionFactory for CdpSessionFactory {
    async fn open_session(&self) -> SessionResult<Arc<dyn ChatSession>> {
        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?
            .result
            .browser_context_id;

        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(SessionError::Script)?;

        let page = match self.browser.new_page(params).await {
            Ok(page) => page,
            Err(e) => {
                // 页面没建起来时，上下文也要释放
                let _ = self
                    .browser
                    .execute(DisposeBrowserContextParams::new(context_id))
                    .await;
                return Err(e.into());
            }
        };

        Ok(Arc::new(CdpSession {
            browser: self.browser.clone(),
            context_id,
            executor: JsExecutor::new(page),
        }))
    }
}
