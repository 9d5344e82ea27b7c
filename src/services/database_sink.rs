//! 结果库写入端

use async_trait::async_trait;
use tracing::{info, warn};

use crate::clients::ResultStoreClient;
use crate::models::result::TestResult;
use crate::services::sink_router::{ResultSink, SinkOutcome};

pub struct DatabaseSink {
    client: ResultStoreClient,
}

impl DatabaseSink {
    pub fn new(client: ResultStoreClient) -> Self {
        Self { client }
    }

    /// 保存结果，失败只记录日志并返回 false
    pub async fn save(&self, result: &TestResult) -> bool {
        match self.client.submit(result).await {
            Ok(id) => {
                info!("[题目 {}] 结果库分配 ID: {}", result.question_id, id);
                true
            }
            Err(e) => {
                warn!(
                    "[题目 {}] 无法写入结果库 ({}): {}",
                    result.question_id,
                    self.client.endpoint(),
                    e
                );
                false
            }
        }
    }
}

#[async_trait]
impl ResultSink for DatabaseSink {
    fn name(&self) -> &'static str {
        "结果库"
    }

    async fn deliver(&self, result: &TestResult) -> SinkOutcome {
        SinkOutcome::from_success(self.save(result).await)
    }
}
