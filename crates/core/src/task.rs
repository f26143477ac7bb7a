//! Background work with completions delivered on one thread.
//!
//! Scrapes block on network I/O, so they run on tokio's blocking pool.
//! Their results must only be touched by the thread that owns the UI state;
//! [`UiLoop`] queues each completion until that thread drains the loop with
//! [`UiLoop::run_pending`] or [`UiLoop::next`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use uuid::Uuid;

type Completion = Box<dyn FnOnce() + Send>;

/// Cooperative cancellation flag shared between a task and its handle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to a spawned task.
#[derive(Clone)]
pub struct TaskHandle {
    id: Uuid,
    name: String,
    token: CancelToken,
}

impl TaskHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the task to stop. Its completion will not be delivered, even if
    /// the work already finished.
    pub fn cancel(&self) {
        debug!(task = %self.id, name = %self.name, "Cancelling task");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

pub struct UiLoop {
    runtime: Handle,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    in_flight: Arc<AtomicUsize>,
}

impl UiLoop {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            tx,
            rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run `work` on the blocking pool and queue `on_done` with its output.
    ///
    /// `work` gets the task's [`CancelToken`] to check between steps. A task
    /// that panics is logged and produces no completion.
    pub fn spawn<T, W, C>(&self, name: &str, work: W, on_done: C) -> TaskHandle
    where
        T: Send + 'static,
        W: FnOnce(&CancelToken) -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let handle = TaskHandle {
            id: Uuid::new_v4(),
            name: name.to_string(),
            token: CancelToken::new(),
        };
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let worker_token = handle.token.clone();
        let join = self
            .runtime
            .spawn_blocking(move || work(&worker_token));

        let tx = self.tx.clone();
        let token = handle.token.clone();
        let id = handle.id;
        let task_name = handle.name.clone();
        self.runtime.spawn(async move {
            let completion: Completion = match join.await {
                Ok(output) => Box::new(move || {
                    if token.is_cancelled() {
                        debug!(task = %id, name = %task_name, "Dropping result of cancelled task");
                    } else {
                        on_done(output);
                    }
                }),
                Err(e) => {
                    warn!(task = %id, name = %task_name, "Task failed: {}", e);
                    Box::new(|| {})
                }
            };
            // the receiver lives as long as the loop; a send error means the
            // loop is gone and nobody wants the result
            let _ = tx.send(completion);
        });

        debug!(task = %handle.id, name, "Spawned task");
        handle
    }

    /// Tasks spawned whose completion has not run yet.
    pub fn pending(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run every completion that is ready, without waiting. Returns how many
    /// ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.finish(completion);
            ran += 1;
        }
        ran
    }

    /// Wait for the next completion and run it. Returns `false` once no
    /// task is outstanding.
    pub async fn next(&mut self) -> bool {
        if self.pending() == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(completion) => {
                self.finish(completion);
                true
            }
            None => false,
        }
    }

    fn finish(&self, completion: Completion) {
        completion();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn completions_run_on_the_draining_thread() {
        let mut ui = UiLoop::new(Handle::current());
        let ui_thread = thread::current().id();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = seen.clone();
            ui.spawn(
                "square",
                move |_| {
                    assert_ne!(thread::current().id(), ui_thread);
                    i * i
                },
                move |out| {
                    assert_eq!(thread::current().id(), ui_thread);
                    seen.lock().unwrap().push(out);
                },
            );
        }
        assert_eq!(ui.pending(), 3);
        while ui.next().await {}

        let mut got = seen.lock().unwrap().clone();
        got.sort();
        assert_eq!(got, vec![0, 1, 4]);
        assert_eq!(ui.pending(), 0);
    }

    #[tokio::test]
    async fn cancelled_task_delivers_nothing() {
        let mut ui = UiLoop::new(Handle::current());
        let delivered = Arc::new(AtomicBool::new(false));
        let flag = delivered.clone();

        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let handle = ui.spawn(
            "slow",
            move |token| {
                let _ = release_rx.recv();
                token.is_cancelled()
            },
            move |_| flag.store(true, Ordering::SeqCst),
        );
        handle.cancel();
        release_tx.send(()).unwrap();

        while ui.next().await {}
        assert!(handle.is_cancelled());
        assert!(!delivered.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn panicking_task_is_not_delivered() {
        let mut ui = UiLoop::new(Handle::current());
        let delivered = Arc::new(AtomicBool::new(false));
        let flag = delivered.clone();
        ui.spawn(
            "boom",
            |_| -> u32 { panic!("worker failed") },
            move |_| flag.store(true, Ordering::SeqCst),
        );
        while ui.next().await {}
        assert!(!delivered.load(Ordering::SeqCst));
        assert_eq!(ui.pending(), 0);
    }

    #[test]
    fn run_pending_drains_ready_completions() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut ui = UiLoop::new(rt.handle().clone());
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let count = count.clone();
            ui.spawn("noop", |_| (), move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut ran = 0;
        while ran < 2 && Instant::now() < deadline {
            ran += ui.run_pending();
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(ran, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(ui.run_pending(), 0);
    }
}
