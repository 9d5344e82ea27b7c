//! 批量测试处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次测试运行的资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、生成工作表名、加载题目、启动浏览器、创建写入端
//! 2. **任务登记**：运行前占用任务槽位，保证同时只有一个运行
//! 3. **委托调度**：把题目集交给 [`BatchScheduler`]
//! 4. **资源管理**：唯一持有浏览器的模块，运行结束后关闭
//! 5. **全局统计**：输出最终通过率

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::browser::BrowserHandle;
use crate::clients::{ResultStoreClient, SheetsClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::loaders::load_fixture_file;
use crate::models::result::{RunLabels, RunReport};
use crate::models::FixtureSet;
use crate::orchestrator::batch_scheduler::{BatchScheduler, SchedulerSettings};
use crate::orchestrator::job_registry::JobRegistry;
use crate::services::{
    generate_sheet_name, sheet_base_name, DatabaseSink, ResultSink, SinkRouter, SpreadsheetSink,
};
use crate::utils::logging::{init_log_file, log_fixtures_loaded, log_startup, print_final_stats};
use crate::workflow::QuestionFlow;

/// 应用主结构
pub struct App {
    config: Config,
    labels: RunLabels,
    fixtures: FixtureSet,
    browser: BrowserHandle,
    router: Arc<SinkRouter>,
    jobs: Arc<JobRegistry>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        let environment = config.environment();
        let sheet_name = generate_sheet_name(&sheet_base_name(&config.test_type, environment), Local::now());
        let labels = RunLabels {
            test_type: config.test_type.clone(),
            environment: environment.label().to_string(),
            batch_label: sheet_name.clone(),
        };

        // 初始化日志文件
        init_log_file(&config.output_log_file, &sheet_name)?;
        log_startup(&config);

        let fixtures = load_fixture_file(Path::new(&config.fixture_file), config.max_questions).await?;

        let router = Arc::new(build_router(&config, &sheet_name)?);

        let browser = BrowserHandle::start(&config).await?;

        Ok(Self {
            config,
            labels,
            fixtures,
            browser,
            router,
            jobs: JobRegistry::new(),
        })
    }

    /// 任务登记表，供外部查询状态或取消
    pub fn jobs(&self) -> Arc<JobRegistry> {
        self.jobs.clone()
    }

    pub fn labels(&self) -> &RunLabels {
        &self.labels
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<RunReport> {
        let ticket = match self.jobs.try_acquire(self.labels.batch_label.clone()) {
            Ok(ticket) => ticket,
            Err(e) => {
                self.browser.shutdown().await;
                return Err(e.into());
            }
        };
        ticket.start();

        log_fixtures_loaded(self.fixtures.len(), self.config.batch_size);

        let scheduler = BatchScheduler::new(
            SchedulerSettings::from(&self.config),
            Arc::new(self.browser.session_factory()),
            Arc::new(QuestionFlow::from_config(&self.config, self.labels.clone())),
            self.router.clone(),
        );

        let report = scheduler.run(&self.fixtures, Some(&ticket)).await;
        let status = ticket.finish(true);
        info!("📋 任务状态: {}", status);

        // 输出最终统计
        print_final_stats(&report, &self.labels.batch_label, &self.config.output_log_file);

        drop(scheduler);
        self.browser.shutdown().await;

        Ok(report)
    }
}

/// 创建两个写入端；缺少表格凭据时表格端降级为空操作
fn build_router(config: &Config, sheet_name: &str) -> AppResult<SinkRouter> {
    let spreadsheet: Arc<dyn ResultSink> = match (&config.sheets_access_token, config.sheets_enabled()) {
        (Some(token), true) => {
            let client = SheetsClient::new(
                &config.sheets_api_base,
                &config.spreadsheet_id,
                token,
                config.result_store_timeout(),
            )?;
            info!("📊 结果将写入工作表: {}", sheet_name);
            Arc::new(SpreadsheetSink::new(client, sheet_name))
        }
        _ => {
            warn!("⚠️ 未配置表格凭据，跳过表格写入");
            Arc::new(SpreadsheetSink::disabled(sheet_name))
        }
    };

    let store = ResultStoreClient::new(&config.api_url, config.result_store_timeout())?;
    info!("💾 结果库地址: {}", store.endpoint());
    let database: Arc<dyn ResultSink> = Arc::new(DatabaseSink::new(store));

    Ok(SinkRouter::new(spreadsheet, database))
}
