//! GetCycleStatisticsHandler - Query handler for a user's fasting
//! statistics.

use std::sync::Arc;

use crate::application::cache::RefCache;
use crate::domain::cycle::{CycleError, CycleStatistics};
use crate::domain::foundation::UserId;
use crate::ports::CycleRepository;

#[derive(Debug, Clone)]
pub struct GetCycleStatisticsQuery {
    pub user_id: UserId,
}

pub struct GetCycleStatisticsHandler {
    repository: Arc<dyn CycleRepository>,
    cache: Arc<RefCache>,
}

impl GetCycleStatisticsHandler {
    pub fn new(repository: Arc<dyn CycleRepository>, cache: Arc<RefCache>) -> Self {
        Self { repository, cache }
    }

    pub async fn handle(&self, query: GetCycleStatisticsQuery) -> Result<CycleStatistics, CycleError> {
        let completed = self.repository.list_completed(&query.user_id).await?;
        let mut stats = CycleStatistics::from_records(&completed);
        stats.has_cycle_in_progress = self.cache.get(&query.user_id).await?.is_some();
        Ok(stats)
    }
}
