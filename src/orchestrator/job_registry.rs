//! 单槽任务登记表
//!
//! 同一时间只允许一个测试任务处于活动状态。占槽是一次比较并交换：
//! 槽位空闲（或上一个任务已结束）才能登记新任务。
//!
//! 取消是带外的：外部调用 [`JobRegistry::cancel`] 只设置标记，
//! 调度器在批次之间检查 [`JobTicket::is_cancelled`]。

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::error::JobError;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct JobRecord {
    id: String,
    status: JobStatus,
    cancel_requested: bool,
}

/// 任务登记表
#[derive(Debug, Default)]
pub struct JobRegistry {
    slot: Mutex<Option<JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Option<JobRecord>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 尝试占用槽位；已有活动任务时返回 [`JobError::SlotOccupied`]
    pub fn try_acquire(self: &Arc<Self>, job_id: impl Into<String>) -> Result<JobTicket, JobError> {
        let job_id = job_id.into();
        let mut slot = self.lock();
        if let Some(current) = slot.as_ref() {
            if current.status.is_active() {
                return Err(JobError::SlotOccupied {
                    active_job: current.id.clone(),
                });
            }
        }
        *slot = Some(JobRecord {
            id: job_id.clone(),
            status: JobStatus::Queued,
            cancel_requested: false,
        });
        info!("📋 任务 {} 已登记", job_id);

        Ok(JobTicket {
            registry: Arc::clone(self),
            job_id,
        })
    }

    /// 请求取消任务，正在执行的批次会跑完
    pub fn cancel(&self, job_id: &str) -> Result<(), JobError> {
        let mut slot = self.lock();
        let record = match slot.as_mut() {
            Some(record) if record.id == job_id => record,
            _ => return Err(JobError::UnknownJob(job_id.to_string())),
        };
        if !record.status.is_active() {
            return Err(JobError::InvalidState {
                job_id: job_id.to_string(),
                status: record.status.to_string(),
            });
        }
        record.cancel_requested = true;
        info!("🛑 任务 {} 已请求取消", job_id);
        Ok(())
    }

    pub fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.lock()
            .as_ref()
            .filter(|record| record.id == job_id)
            .map(|record| record.status)
    }

    /// 当前活动任务的 ID
    pub fn active_job(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .filter(|record| record.status.is_active())
            .map(|record| record.id.clone())
    }

    fn update(&self, job_id: &str, f: impl FnOnce(&mut JobRecord)) {
        if let Some(record) = self.lock().as_mut().filter(|record| record.id == job_id) {
            f(record);
        }
    }
}

/// 占用槽位的凭证
///
/// 未调用 [`JobTicket::finish`] 就被丢弃时，任务记为失败并释放槽位
#[derive(Debug)]
pub struct JobTicket {
    registry: Arc<JobRegistry>,
    job_id: String,
}

impl JobTicket {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn start(&self) {
        self.registry.update(&self.job_id, |record| {
            if record.status == JobStatus::Queued {
                record.status = JobStatus::Running;
            }
        });
    }

    pub fn is_cancelled(&self) -> bool {
        let slot = self.registry.lock();
        slot.as_ref()
            .filter(|record| record.id == self.job_id)
            .map(|record| record.cancel_requested)
            .unwrap_or(false)
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.registry.status(&self.job_id)
    }

    /// 结束任务并释放槽位，返回最终状态
    pub fn finish(self, success: bool) -> JobStatus {
        self.settle(success)
    }

    fn settle(&self, success: bool) -> JobStatus {
        let mut final_status = JobStatus::Failed;
        self.registry.update(&self.job_id, |record| {
            if record.status.is_active() {
                record.status = if record.cancel_requested {
                    JobStatus::Cancelled
                } else if success {
                    JobStatus::Completed
                } else {
                    JobStatus::Failed
                };
            }
            final_status = record.status;
        });
        final_status
    }
}

impl Drop for JobTicket {
    fn drop(&mut self) {
        self.settle(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_active_job() {
        let registry = JobRegistry::new();
        let ticket = registry.try_acquire("job-1").unwrap();
        assert_eq!(
            registry.try_acquire("job-2").unwrap_err(),
            JobError::SlotOccupied {
                active_job: "job-1".to_string()
            }
        );

        ticket.start();
        assert_eq!(registry.status("job-1"), Some(JobStatus::Running));
        assert_eq!(ticket.finish(true), JobStatus::Completed);

        assert!(registry.active_job().is_none());
        let next = registry.try_acquire("job-2").unwrap();
        assert_eq!(next.status(), Some(JobStatus::Queued));
    }

    #[test]
    fn cancel_is_observed_and_recorded() {
        let registry = JobRegistry::new();
        let ticket = registry.try_acquire("job-1").unwrap();
        ticket.start();
        assert!(!ticket.is_cancelled());

        registry.cancel("job-1").unwrap();
        assert!(ticket.is_cancelled());
        assert_eq!(ticket.finish(true), JobStatus::Cancelled);

        assert!(matches!(
            registry.cancel("job-1"),
            Err(JobError::InvalidState { .. })
        ));
        assert_eq!(
            registry.cancel("other"),
            Err(JobError::UnknownJob("other".to_string()))
        );
    }

    #[test]
    fn dropped_ticket_releases_slot_as_failed() {
        let registry = JobRegistry::new();
        {
            let ticket = registry.try_acquire("job-1").unwrap();
            ticket.start();
        }
        assert_eq!(registry.status("job-1"), Some(JobStatus::Failed));
        assert!(registry.try_acquire("job-2").is_ok());
    }
}
