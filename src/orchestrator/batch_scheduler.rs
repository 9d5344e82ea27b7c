//! 批次调度器 - 编排层
//!
//! 把题目集切成固定大小的批次：
//! - 批次之间严格串行，中间插入冷却时间
//! - 批次内每道题独占一个会话，全部并发执行
//! - 单题的任何失败（包括 panic 和超时）只会变成这道题的 FAIL 结果
//! - 本批所有任务结束后，无论成败都关闭本批的全部会话

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{error, warn};

use crate::browser::{ChatSession, SessionFactory};
use crate::config::Config;
use crate::models::fixture::{FixtureSet, QuestionFixture};
use crate::models::result::{BatchRunSummary, RunReport, TestResult};
use crate::orchestrator::job_registry::JobTicket;
use crate::services::SinkRouter;
use crate::utils::logging::{log_batch_complete, log_batch_start, log_cooldown};
use crate::workflow::{QuestionCtx, QuestionProcessor};

/// 调度参数
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub batch_size: usize,
    /// 批次之间的冷却
    pub cooldown: Duration,
    /// 单道题（含会话内全部操作）的上限
    pub batch_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            batch_size: 2,
            cooldown: Duration::from_secs(4),
            batch_timeout: Duration::from_secs(600),
        }
    }
}

impl From<&Config> for SchedulerSettings {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            cooldown: config.batch_cooldown(),
            batch_timeout: config.batch_timeout(),
        }
    }
}

/// 批次调度器
pub struct BatchScheduler {
    settings: SchedulerSettings,
    factory: Arc<dyn SessionFactory>,
    processor: Arc<dyn QuestionProcessor>,
    router: Arc<SinkRouter>,
}

impl BatchScheduler {
    pub fn new(
        settings: SchedulerSettings,
        factory: Arc<dyn SessionFactory>,
        processor: Arc<dyn QuestionProcessor>,
        router: Arc<SinkRouter>,
    ) -> Self {
        Self {
            settings,
            factory,
            processor,
            router,
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// 按批次大小切分，最后一批可能更小
    pub fn partition<'a>(&self, fixtures: &'a [QuestionFixture]) -> Vec<&'a [QuestionFixture]> {
        fixtures.chunks(self.settings.batch_size.max(1)).collect()
    }

    /// 依次执行所有批次
    ///
    /// 传入任务凭证时，每批开始前（含冷却之后）检查是否已被取消
    pub async fn run(&self, fixtures: &FixtureSet, ticket: Option<&JobTicket>) -> RunReport {
        let started = Instant::now();
        let batches = self.partition(fixtures.fixtures());
        let total_batches = batches.len();
        let total = fixtures.len();
        let mut report = RunReport::default();
        let mut offset = 0;

        for (idx, batch) in batches.iter().enumerate() {
            let batch_num = idx + 1;

            if is_cancelled(ticket) {
                skip_remaining(&mut report, total - offset);
                break;
            }

            if idx > 0 {
                log_cooldown(self.settings.cooldown.as_millis());
                sleep(self.settings.cooldown).await;
                // 冷却期间可能收到取消
                if is_cancelled(ticket) {
                    skip_remaining(&mut report, total - offset);
                    break;
                }
            }

            log_batch_start(batch_num, total_batches, offset + 1, offset + batch.len(), total);
            let summary = self.run_batch(batch, batch_num, total_batches, offset).await;
            log_batch_complete(&summary);

            report.batches.push(summary);
            offset += batch.len();
        }

        report.elapsed_seconds = started.elapsed().as_secs_f64();
        report
    }

    /// 执行单个批次，返回本批统计
    async fn run_batch(
        &self,
        batch: &[QuestionFixture],
        batch_num: usize,
        total_batches: usize,
        offset: usize,
    ) -> BatchRunSummary {
        let mut sessions: Vec<Arc<dyn ChatSession>> = Vec::new();
        let mut handles = Vec::new();

        for (i, fixture) in batch.iter().enumerate() {
            let ctx = QuestionCtx::new(batch_num, total_batches, offset + i + 1, fixture.id.clone());

            let session = match self.factory.open_session().await {
                Ok(session) => {
                    sessions.push(session.clone());
                    Ok(session)
                }
                Err(e) => {
                    error!("{} ❌ 无法创建浏览器会话: {}", ctx, e);
                    Err(format!("Error al crear la sesión del navegador: {}", e))
                }
            };

            let processor = self.processor.clone();
            let router = self.router.clone();
            let fixture_clone = fixture.clone();
            let limit = self.settings.batch_timeout;

            let handle = tokio::spawn(async move {
                let result = match session {
                    Ok(session) => {
                        run_question(processor.as_ref(), &fixture_clone, session.as_ref(), &ctx, limit)
                            .await
                    }
                    Err(message) => {
                        TestResult::execution_error(&fixture_clone, processor.labels(), message, 0.0)
                    }
                };
                router.deliver(&result).await;
                result
            });
            handles.push((fixture, handle));
        }

        // 等待本批所有任务完成
        let mut pass_count = 0;
        let mut fail_count = 0;

        for (fixture, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!("[题目 {}] 任务执行失败: {}", fixture.id, e);
                    let result = TestResult::execution_error(
                        fixture,
                        self.processor.labels(),
                        format!("Error inesperado en la ejecución: {}", e),
                        0.0,
                    );
                    self.router.deliver(&result).await;
                    result
                }
            };

            if result.is_pass() {
                pass_count += 1;
            } else {
                fail_count += 1;
            }
        }

        for session in sessions {
            if let Err(e) = session.close().await {
                warn!("关闭浏览器会话失败: {}", e);
            }
        }

        BatchRunSummary::new(batch_num, total_batches, pass_count, fail_count)
    }
}

fn is_cancelled(ticket: Option<&JobTicket>) -> bool {
    ticket.is_some_and(|t| t.is_cancelled())
}

fn skip_remaining(report: &mut RunReport, remaining: usize) {
    report.skipped = remaining;
    warn!("🛑 任务已取消，跳过剩余 {} 道题", remaining);
}

/// 在单题上限内处理一道题
async fn run_question(
    processor: &dyn QuestionProcessor,
    fixture: &QuestionFixture,
    session: &dyn ChatSession,
    ctx: &QuestionCtx,
    limit: Duration,
) -> TestResult {
    match timeout(limit, processor.process(fixture, session, ctx)).await {
        Ok(result) => result,
        Err(_) => {
            error!("{} ⏰ 超过 {}s 上限", ctx, limit.as_secs());
            TestResult::execution_error(
                fixture,
                processor.labels(),
                format!("Tiempo de espera agotado ({}s)", limit.as_secs()),
                limit.as_secs_f64(),
            )
        }
    }
}
