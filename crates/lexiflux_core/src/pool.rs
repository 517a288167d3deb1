use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

/// Uniform map-style execution surface over a batch of work items.
///
/// `map` applies the task to every item and returns the results in
/// input order, regardless of how the implementation schedules the
/// work. The pipeline communicates with its pool exclusively through
/// this method.
pub trait WorkerPool {
    fn map<I, O, F>(&self, task: F, items: Vec<I>) -> Vec<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> O + Send + Sync + 'static;
}

/// Pool that executes synchronously on the caller thread.
///
/// Deterministic and allocation-free; the default choice for tests and
/// for I/O-bound extractors where parallelism buys nothing.
pub struct InThreadPool;

impl InThreadPool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool for InThreadPool {
    fn map<I, O, F>(&self, task: F, items: Vec<I>) -> Vec<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        items.into_iter().map(task).collect()
    }
}

type Job = Box<dyn FnOnce() + Send>;

struct QueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

struct Queue {
    state: Mutex<QueueState>,
    work_available: Condvar,
}

/// Pool backed by persistent worker threads.
///
/// Jobs go through a shared queue; each `map` item gets a result slot
/// that the submitting thread awaits in input order. A panicking task
/// is captured on the worker and re-raised on the awaiting thread.
/// Dropping the pool drains the queue and joins the workers.
pub struct ThreadPool {
    queue: Arc<Queue>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        let queue = Arc::new(Queue {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            work_available: Condvar::new(),
        });

        let workers = (0..concurrency)
            .map(|index| {
                let queue = Arc::clone(&queue);
                thread::Builder::new()
                    .name(format!("lexiflux-worker-{}", index))
                    .spawn(move || worker_loop(&queue))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self { queue, workers }
    }

    /// Pool sized to the machine's available parallelism.
    pub fn with_default_concurrency() -> Self {
        let concurrency = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(concurrency)
    }

    fn submit(&self, job: Job) {
        let mut state = self.queue.state.lock().expect("worker queue poisoned");
        state.jobs.push_back(job);
        self.queue.work_available.notify_one();
    }
}

fn worker_loop(queue: &Queue) {
    loop {
        let job = {
            let mut state = queue.state.lock().expect("worker queue poisoned");
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                if state.closed {
                    return;
                }
                state = queue
                    .work_available
                    .wait(state)
                    .expect("worker queue poisoned");
            }
        };
        job();
    }
}

impl WorkerPool for ThreadPool {
    fn map<I, O, F>(&self, task: F, items: Vec<I>) -> Vec<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        let task = Arc::new(task);

        let slots: Vec<Arc<ResultSlot<O>>> = items
            .into_iter()
            .map(|item| {
                let slot = Arc::new(ResultSlot::new());
                let task = Arc::clone(&task);
                let filled = Arc::clone(&slot);
                self.submit(Box::new(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(item)));
                    filled.fill(outcome);
                }));
                slot
            })
            .collect();

        slots.into_iter().map(|slot| slot.wait()).collect()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        {
            let mut state = self.queue.state.lock().expect("worker queue poisoned");
            state.closed = true;
        }
        self.queue.work_available.notify_all();

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// One-shot rendezvous between a worker and the thread awaiting its result.
struct ResultSlot<O> {
    value: Mutex<Option<thread::Result<O>>>,
    ready: Condvar,
}

impl<O> ResultSlot<O> {
    fn new() -> Self {
        Self {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn fill(&self, outcome: thread::Result<O>) {
        let mut value = self.value.lock().expect("result slot poisoned");
        *value = Some(outcome);
        self.ready.notify_one();
    }

    fn wait(&self) -> O {
        let mut value = self.value.lock().expect("result slot poisoned");
        loop {
            if let Some(outcome) = value.take() {
                match outcome {
                    Ok(result) => return result,
                    Err(payload) => panic::resume_unwind(payload),
                }
            }
            value = self.ready.wait(value).expect("result slot poisoned");
        }
    }
}
