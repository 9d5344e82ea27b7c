use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
///
/// 所有时间参数都是针对外部聊天机器人的经验值，可通过环境变量覆盖
#[derive(Clone, Debug)]
pub struct Config {
    /// 机器人页面地址
    pub bot_url: String,
    /// 测试类型（对应题库名，如 inmobiliario）
    pub test_type: String,
    /// 题目 TOML 文件
    pub fixture_file: String,
    /// 最多读取的题目行数
    pub max_questions: usize,

    // --- 批次调度 ---
    /// 每批并发的题目数
    pub batch_size: usize,
    /// 批次之间的冷却时间（毫秒）
    pub batch_cooldown_ms: u64,
    /// 单批次的总超时（秒）
    pub batch_timeout_secs: u64,

    // --- 轮询 ---
    pub poll_attempts: usize,
    pub poll_interval_ms: u64,
    pub poll_settle_ms: u64,

    // --- 聊天入口 ---
    pub render_wait_ms: u64,
    pub launcher_timeout_secs: u64,
    pub input_timeout_secs: u64,
    /// 诊断截图目录
    pub screenshot_dir: String,

    // --- 浏览器 ---
    pub headless: bool,
    pub chrome_executable: Option<String>,
    /// 非无头模式时连接的调试端口
    pub browser_debug_port: u16,

    // --- 结果库 API ---
    pub api_url: String,
    pub result_store_timeout_secs: u64,

    // --- 电子表格 ---
    pub sheets_api_base: String,
    pub spreadsheet_id: String,
    /// 由外部凭据加载器提供的访问令牌，缺失时表格写入降级为空操作
    pub sheets_access_token: Option<String>,

    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_url: "https://preprod.rentascordoba.gob.ar/bot-web".to_string(),
            test_type: "inmobiliario".to_string(),
            fixture_file: "fixtures/inmobiliario.toml".to_string(),
            max_questions: 1000,
            batch_size: 2,
            batch_cooldown_ms: 4000,
            batch_timeout_secs: 600,
            poll_attempts: 15,
            poll_interval_ms: 5000,
            poll_settle_ms: 500,
            render_wait_ms: 5000,
            launcher_timeout_secs: 60,
            input_timeout_secs: 60,
            screenshot_dir: "test-results".to_string(),
            headless: true,
            chrome_executable: None,
            browser_debug_port: 9222,
            api_url: "http://localhost:8000".to_string(),
            result_store_timeout_secs: 30,
            sheets_api_base: "https://sheets.googleapis.com".to_string(),
            spreadsheet_id: String::new(),
            sheets_access_token: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        let token = std::env::var("SHEETS_ACCESS_TOKEN")
            .ok()
            .or_else(|| {
                std::env::var("SHEETS_TOKEN_FILE")
                    .ok()
                    .and_then(|path| std::fs::read_to_string(path).ok())
            })
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            bot_url: std::env::var("BOT_URL").unwrap_or(default.bot_url),
            test_type: std::env::var("TEST_TYPE").unwrap_or(default.test_type),
            fixture_file: std::env::var("FIXTURE_FILE").unwrap_or(default.fixture_file),
            max_questions: env_or("MAX_QUESTIONS", default.max_questions),
            batch_size: env_or("BATCH_SIZE", default.batch_size),
            batch_cooldown_ms: env_or("BATCH_COOLDOWN_MS", default.batch_cooldown_ms),
            batch_timeout_secs: env_or("BATCH_TIMEOUT_SECS", default.batch_timeout_secs),
            poll_attempts: env_or("POLL_ATTEMPTS", default.poll_attempts),
            poll_interval_ms: env_or("POLL_INTERVAL_MS", default.poll_interval_ms),
            poll_settle_ms: env_or("POLL_SETTLE_MS", default.poll_settle_ms),
            render_wait_ms: env_or("RENDER_WAIT_MS", default.render_wait_ms),
            launcher_timeout_secs: env_or("LAUNCHER_TIMEOUT_SECS", default.launcher_timeout_secs),
            input_timeout_secs: env_or("INPUT_TIMEOUT_SECS", default.input_timeout_secs),
            screenshot_dir: std::env::var("SCREENSHOT_DIR").unwrap_or(default.screenshot_dir),
            headless: env_or("HEADLESS", default.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            browser_debug_port: env_or("BROWSER_DEBUG_PORT", default.browser_debug_port),
            api_url: std::env::var("API_URL").unwrap_or(default.api_url),
            result_store_timeout_secs: env_or(
                "RESULT_STORE_TIMEOUT_SECS",
                default.result_store_timeout_secs,
            ),
            sheets_api_base: std::env::var("SHEETS_API_BASE").unwrap_or(default.sheets_api_base),
            spreadsheet_id: std::env::var("SPREADSHEET_ID").unwrap_or(default.spreadsheet_id),
            sheets_access_token: token,
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 校验会让调度器无法工作的参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_url.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                var_name: "BOT_URL".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "BATCH_SIZE".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        if self.poll_attempts == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "POLL_ATTEMPTS".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn environment(&self) -> Environment {
        Environment::detect(&self.bot_url)
    }

    /// 表格写入是否可用（需要表格 ID 和访问令牌）
    pub fn sheets_enabled(&self) -> bool {
        !self.spreadsheet_id.trim().is_empty() && self.sheets_access_token.is_some()
    }

    pub fn batch_cooldown(&self) -> Duration {
        Duration::from_millis(self.batch_cooldown_ms)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_settle(&self) -> Duration {
        Duration::from_millis(self.poll_settle_ms)
    }

    pub fn result_store_timeout(&self) -> Duration {
        Duration::from_secs(self.result_store_timeout_secs)
    }
}

/// 被测机器人所在的环境，由页面地址推断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Localhost,
    Preprod,
    Web,
}

impl Environment {
    pub fn detect(bot_url: &str) -> Self {
        if bot_url.contains("localhost") || bot_url.contains("127.0.0.1") {
            Environment::Localhost
        } else if bot_url.contains("preprod") {
            Environment::Preprod
        } else {
            Environment::Web
        }
    }

    /// 写入结果库的环境标签
    pub fn label(&self) -> &'static str {
        match self {
            Environment::Localhost => "localhost",
            Environment::Preprod => "preprod",
            Environment::Web => "dev",
        }
    }

    /// 表格名后缀
    pub fn sheet_suffix(&self) -> &'static str {
        match self {
            Environment::Localhost => "_Local",
            Environment::Preprod => "_Preprod",
            Environment::Web => "",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Environment::Localhost => "Localhost",
            Environment::Preprod => "Pre-prod",
            Environment::Web => "Web",
        }
    }
}
