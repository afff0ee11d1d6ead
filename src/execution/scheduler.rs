//! Job scheduler - decides how many independent jobs launch at once

/// Strategy for scheduling job execution
///
/// Jobs declare no ordering between each other, so every strategy is just
/// a concurrency policy over an independent set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingStrategy {
    /// Launch every selected job at once
    Parallel,

    /// One job at a time, in enumeration order
    Sequential,

    /// At most N jobs at once
    LimitedParallel(usize),
}

impl Default for SchedulingStrategy {
    fn default() -> Self {
        SchedulingStrategy::Parallel
    }
}

/// Batches pending jobs according to the strategy
pub struct JobScheduler {
    strategy: SchedulingStrategy,
}

impl JobScheduler {
    pub fn new(strategy: SchedulingStrategy) -> Self {
        Self { strategy }
    }

    /// Next batch of jobs to launch, taken from the front of `pending`
    pub fn next_batch(&self, pending: &[String]) -> Vec<String> {
        let take = match self.strategy {
            SchedulingStrategy::Parallel => pending.len(),
            SchedulingStrategy::Sequential => 1,
            SchedulingStrategy::LimitedParallel(max) => max.max(1),
        };
        pending.iter().take(take).cloned().collect()
    }
}
