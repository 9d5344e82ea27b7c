pub mod cdp_session;
pub mod connection;
pub mod headless;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, Handler};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::BrowserError;

pub use cdp_session::{CdpSession, CdpSessionFactory};
pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;
pub use session::{ChatSession, SessionFactory};

/// 运行中的浏览器及其 CDP 事件循环
pub struct BrowserHandle {
    browser: Arc<Browser>,
    handler_task: JoinHandle<()>,
}

impl BrowserHandle {
    /// 按配置启动无头浏览器或连接已有浏览器
    pub async fn start(config: &Config) -> Result<Self, BrowserError> {
        let (browser, handler) = if config.headless {
            launch_headless_browser(config.chrome_executable.as_deref()).await?
        } else {
            connect_to_browser(config.browser_debug_port).await?
        };

        let handler_task = spawn_handler(handler);

        // 添加短暂延迟以等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        Ok(Self {
            browser: Arc::new(browser),
            handler_task,
        })
    }

    pub fn session_factory(&self) -> CdpSessionFactory {
        CdpSessionFactory::new(self.browser.clone())
    }

    /// 关闭浏览器；仍有会话持有引用时只停止事件循环
    pub async fn shutdown(self) {
        match Arc::try_unwrap(self.browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    warn!("关闭浏览器失败: {}", e);
                }
                let _ = browser.wait().await;
            }
            Err(_) => warn!("浏览器仍被引用，跳过关闭"),
        }
        self.handler_task.abort();
        debug!("浏览器事件循环已停止");
    }
}

/// 在后台处理浏览器事件
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}
