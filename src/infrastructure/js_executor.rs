//! JS 执行器 - 基础设施层
//!
//! 持有会话的 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{SessionError, SessionResult};

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识题目、批次
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> SessionResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        result
            .into_value()
            .map_err(|e| SessionError::Script(e.to_string()))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> SessionResult<T> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(|e| SessionError::Script(e.to_string()))
    }
}

/// 把 CSS 选择器编码成 JS 字符串字面量
pub fn js_string(value: &str) -> SessionResult<String> {
    serde_json::to_string(value).map_err(|e| SessionError::Script(e.to_string()))
}

/// 判断选择器命中的第一个元素是否可见
pub fn visibility_script(selector: &str) -> SessionResult<String> {
    Ok(format!(
        r#"
        (() => {{
            const el = document.querySelector({});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            return style.visibility !== 'hidden' && style.display !== 'none' && rect.width > 0 && rect.height > 0;
        }})()
        "#,
        js_string(selector)?
    ))
}

/// 读取选择器命中的所有元素文本
pub fn text_contents_script(selector: &str) -> SessionResult<String> {
    Ok(format!(
        "Array.from(document.querySelectorAll({})).map(e => e.textContent || '')",
        js_string(selector)?
    ))
}

/// 清空输入框内容
pub fn clear_input_script(selector: &str) -> SessionResult<String> {
    Ok(format!(
        r#"
        (() => {{
            const el = document.querySelector({});
            if (!el) return false;
            el.value = '';
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            return true;
        }})()
        "#,
        js_string(selector)?
    ))
}
