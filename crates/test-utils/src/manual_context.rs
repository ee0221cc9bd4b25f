use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use reactive_command::exec::{ExecutionContext, Job};

/// An execution context that queues jobs until the test runs them.
///
/// Lets a test observe a deferred command between `execute` returning and
/// its body running, and drop jobs to simulate a context that never gets to
/// them.
#[derive(Clone, Default)]
pub struct ManualContext {
    queue: Arc<Mutex<VecDeque<Job>>>,
}

impl ManualContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Run the oldest queued job to completion. Returns `false` if the queue
    /// was empty.
    pub async fn run_next(&self) -> bool {
        let job = self.queue.lock().unwrap().pop_front();
        match job {
            Some(job) => {
                job.await;
                true
            }
            None => false,
        }
    }

    /// Run queued jobs until none are left, including jobs queued while
    /// running. Returns how many ran.
    pub async fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next().await {
            ran += 1;
        }
        ran
    }

    /// Drop every queued job without running it.
    pub fn drop_all(&self) -> usize {
        let jobs: Vec<Job> = self.queue.lock().unwrap().drain(..).collect();
        let dropped = jobs.len();
        drop(jobs);
        dropped
    }
}

impl ExecutionContext for ManualContext {
    fn spawn(&self, job: Job) {
        self.queue.lock().unwrap().push_back(job);
    }
}
