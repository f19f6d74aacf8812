use crate::error::SetupError;
use crossbeam::channel::{Receiver, Sender, bounded, unbounded};
use crossbeam::sync::WaitGroup;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Sizing decision for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfiguration {
    /// Parallelism reported by the host
    pub available: usize,
    /// User limit, `None` when unlimited
    pub cap: Option<usize>,
    /// Number of workers to start
    pub size: usize,
}

impl PoolConfiguration {
    /// `min(available, cap, work_items)`; zero work means zero workers
    pub fn compute(available: usize, max_workers: usize, work_items: usize) -> Self {
        let cap = (max_workers > 0).then_some(max_workers);
        let limit = cap.map_or(available, |cap| available.min(cap));
        Self {
            available,
            cap,
            size: limit.max(1).min(work_items),
        }
    }

    /// Size against the CPUs of this machine
    pub fn detect(max_workers: usize, work_items: usize) -> Self {
        Self::compute(num_cpus::get(), max_workers, work_items)
    }
}

/// Why a submitted task produced no value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task was dropped before completing")]
    Lost,
}

/// Handle to the eventual result of a submitted task
pub struct TaskHandle<R> {
    result_rx: Receiver<Result<R, TaskError>>,
}

impl<R> TaskHandle<R> {
    /// Block until the task has finished
    pub fn wait(self) -> Result<R, TaskError> {
        self.result_rx.recv().unwrap_or(Err(TaskError::Lost))
    }
}

/// Fixed set of worker threads created up front
///
/// Each worker runs one task at a time; extra tasks queue until a worker frees
/// up. Threads are joined on [`WorkerPool::shutdown`] or on drop, whichever
/// comes first.
pub struct WorkerPool {
    job_tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    pending: WaitGroup,
}

impl WorkerPool {
    /// Start `size` named worker threads
    pub fn new(size: usize) -> Result<Self, SetupError> {
        let (job_tx, job_rx): (Sender<Job>, Receiver<Job>) = unbounded();
        let mut pool = Self {
            job_tx: Some(job_tx),
            workers: Vec::with_capacity(size),
            pending: WaitGroup::new(),
        };

        for worker_id in 0..size {
            let job_rx = job_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("precompress-worker-{worker_id}"))
                .spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        job();
                    }
                })
                // Dropping `pool` here joins the workers already started
                .map_err(|source| SetupError::PoolSpawn { worker_id, source })?;
            pool.workers.push(handle);
        }

        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task, returning a handle to its result
    pub fn submit<F, R>(&self, work: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (result_tx, result_rx) = bounded(1);
        let handle = TaskHandle { result_rx };

        let Some(job_tx) = &self.job_tx else {
            return handle;
        };

        let completion = self.pending.clone();
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(work))
                .map_err(|payload| TaskError::Panicked(panic_message(payload.as_ref())));
            let _ = result_tx.send(result);
            drop(completion);
        });

        // A rejected job is dropped with its sender, so the handle reports `Lost`
        let _ = job_tx.send(job);
        handle
    }

    /// Wait until every task submitted so far has completed
    pub fn join(&mut self) {
        std::mem::replace(&mut self.pending, WaitGroup::new()).wait();
    }

    /// Close the queue and join every worker thread
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        drop(self.job_tx.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.release();
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
