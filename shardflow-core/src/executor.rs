//! Segment-iteration executors
//!
//! An executor visits every segment index of a data source, runs the
//! per-segment work, and hands each result back to the task in index order.
//! `SerialExecutor` does both steps on the calling thread;
//! `ParallelExecutor` processes windows of segments on a rayon pool and
//! collects each window in order. Both stop at the first error in index order.

use crate::error::{Result, ShardflowError};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use tracing::debug;

/// Default number of segments processed per parallel window
pub const DEFAULT_PARALLEL_BATCH: usize = 64;

/// Per-segment work driven by an executor
pub trait SegmentTask: Send + Sync {
    /// Result of processing one segment
    type Output: Send;

    /// Process the segment at `index`. May run concurrently with other segments.
    fn process(&self, index: u64) -> Result<Self::Output>;

    /// Commit the output of segment `index`. Called in ascending index order.
    fn collect(&mut self, index: u64, output: Self::Output) -> Result<()>;
}

/// Drives a `SegmentTask` over `segments` indices
pub trait SegmentExecutor {
    fn run<T: SegmentTask>(&self, task: &mut T, segments: u64) -> Result<()>;
}

/// Runs segments one after another on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl SegmentExecutor for SerialExecutor {
    fn run<T: SegmentTask>(&self, task: &mut T, segments: u64) -> Result<()> {
        for index in 0..segments {
            let output = task.process(index)?;
            task.collect(index, output)?;
        }
        Ok(())
    }
}

/// Processes segments in parallel windows using rayon
#[derive(Clone)]
pub struct ParallelExecutor {
    batch: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl ParallelExecutor {
    /// Create an executor on the global rayon pool
    pub fn new(batch: usize) -> Self {
        Self {
            batch: batch.max(1),
            pool: None,
        }
    }

    /// Create an executor with a dedicated pool of `threads` workers
    pub fn with_threads(batch: usize, threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("shardflow-segment-{}", i))
            .build()
            .map_err(|e| ShardflowError::Executor(e.to_string()))?;

        Ok(Self {
            batch: batch.max(1),
            pool: Some(Arc::new(pool)),
        })
    }

    /// Segments processed per window
    pub fn batch(&self) -> usize {
        self.batch
    }

    fn run_windows<T: SegmentTask>(&self, task: &mut T, segments: u64) -> Result<()> {
        let batch = self.batch as u64;
        let mut start = 0u64;

        while start < segments {
            let end = (start + batch).min(segments);
            let shared: &T = &*task;
            let outputs: Vec<Result<T::Output>> = (start..end)
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|index| shared.process(index))
                .collect();

            debug!(start, end, "Processed segment window");

            for (index, output) in (start..end).zip(outputs) {
                task.collect(index, output?)?;
            }
            start = end;
        }

        Ok(())
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_BATCH)
    }
}

impl SegmentExecutor for ParallelExecutor {
    fn run<T: SegmentTask>(&self, task: &mut T, segments: u64) -> Result<()> {
        match &self.pool {
            Some(pool) => pool.install(|| self.run_windows(task, segments)),
            None => self.run_windows(task, segments),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Squares each index; fails at `fail_at` if set
    struct SquareTask {
        fail_at: Option<u64>,
        collected: Vec<(u64, u64)>,
    }

    impl SquareTask {
        fn new(fail_at: Option<u64>) -> Self {
            Self {
                fail_at,
                collected: Vec::new(),
            }
        }
    }

    impl SegmentTask for SquareTask {
        type Output = u64;

        fn process(&self, index: u64) -> Result<u64> {
            if Some(index) == self.fail_at {
                return Err(ShardflowError::Executor(format!("segment {} failed", index)));
            }
            Ok(index * index)
        }

        fn collect(&mut self, index: u64, output: u64) -> Result<()> {
            self.collected.push((index, output));
            Ok(())
        }
    }

    #[test]
    fn test_serial_visits_in_order() {
        let mut task = SquareTask::new(None);
        SerialExecutor.run(&mut task, 5).unwrap();
        assert_eq!(task.collected, vec![(0, 0), (1, 1), (2, 4), (3, 9), (4, 16)]);
    }

    #[test]
    fn test_parallel_collects_in_order() {
        let mut task = SquareTask::new(None);
        ParallelExecutor::new(3).run(&mut task, 10).unwrap();
        let indices: Vec<u64> = task.collected.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
        assert!(task.collected.iter().all(|(i, sq)| i * i == *sq));
    }

    #[test]
    fn test_serial_stops_at_first_error() {
        let mut task = SquareTask::new(Some(2));
        let result = SerialExecutor.run(&mut task, 5);
        assert!(matches!(result, Err(ShardflowError::Executor(_))));
        assert_eq!(task.collected.len(), 2);
    }

    #[test]
    fn test_parallel_stops_at_first_error() {
        let mut task = SquareTask::new(Some(4));
        let result = ParallelExecutor::new(2).run(&mut task, 8);
        assert!(result.is_err());
        assert_eq!(task.collected.len(), 4);
    }

    #[test]
    fn test_parallel_dedicated_pool() {
        let executor = ParallelExecutor::with_threads(4, 2).unwrap();
        let mut task = SquareTask::new(None);
        executor.run(&mut task, 9).unwrap();
        assert_eq!(task.collected.len(), 9);
    }

    #[test]
    fn test_zero_segments() {
        let mut task = SquareTask::new(None);
        SerialExecutor.run(&mut task, 0).unwrap();
        ParallelExecutor::default().run(&mut task, 0).unwrap();
        assert!(task.collected.is_empty());
    }
}
