use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器启动/连接错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 单个会话内的页面操作错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 题目文件错误
    #[error("题目文件错误: {0}")]
    Fixture(#[from] FixtureError),
    /// 结果写入错误
    #[error("结果写入错误: {0}")]
    Sink(#[from] SinkError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 任务登记错误
    #[error("任务错误: {0}")]
    Job(#[from] JobError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

/// 会话错误
///
/// 轮询器会把这些错误全部视为"聊天已关闭"，不会向上传播
#[derive(Debug, Error)]
pub enum SessionError {
    /// 页面或浏览器已关闭
    #[error("会话已关闭: {0}")]
    Closed(String),
    /// 等待元素超时
    #[error("等待元素 {selector} 超时 ({timeout_ms}ms)")]
    Timeout { selector: String, timeout_ms: u64 },
    /// 元素不存在
    #[error("未找到元素: {0}")]
    ElementNotFound(String),
    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    Script(String),
    /// 聊天入口无法打开
    #[error("{0}")]
    ChatUnavailable(String),
    /// CDP 协议错误
    #[error("CDP错误: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 题目文件错误
#[derive(Debug, Error)]
pub enum FixtureError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 过滤后没有可用的题目
    #[error("题目文件中没有可用的题目: {path}")]
    Empty { path: String },
}

/// 结果写入错误
#[derive(Debug, Error)]
pub enum SinkError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回非 2xx
    #[error("服务返回错误状态 ({endpoint}): {status} - {body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 响应解析失败
    #[error("响应解析失败 ({endpoint}): {reason}")]
    DecodeFailed { endpoint: String, reason: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的配置缺失
    #[error("缺少配置 {var_name}")]
    MissingValue { var_name: String },
    /// 参数不合法
    #[error("参数 {name} 不合法: {reason}")]
    InvalidParameter { name: String, reason: String },
}

/// 任务登记错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    /// 已有任务在运行
    #[error("已有任务在运行: {active_job}")]
    SlotOccupied { active_job: String },
    /// 任务不存在
    #[error("任务不存在: {0}")]
    UnknownJob(String),
    /// 任务状态不允许该操作
    #[error("任务 {job_id} 当前状态为 {status}，无法执行该操作")]
    InvalidState { job_id: String, status: String },
}

// ========== 便捷构造函数 ==========

impl SinkError {
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        SinkError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }
}

impl SessionError {
    /// 根据 CDP 错误信息判断页面是否已被关闭
    pub fn is_closed(&self) -> bool {
        match self {
            SessionError::Closed(_) => true,
            SessionError::Cdp(e) => {
                let msg = e.to_string();
                msg.contains("Target closed") || msg.contains("Session closed")
            }
            _ => false,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 会话操作结果类型
pub type SessionResult<T> = Result<T, SessionError>;
