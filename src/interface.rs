//! Threaded interface for running corpus analyses in the background.
//!
//! Every long-running analysis takes an [`AnalysisContext`]: a cancellation
//! token polled between units of work plus an optional progress sink called
//! at a fixed granularity. [`AnalysisRunner`] runs one analysis per thread
//! over a shared corpus and streams [`AnalysisEvent`]s back over a channel.
//! Cancellation is cooperative, so a worker may take a moment to observe it.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::corpus::Corpus;
use crate::error::{PhonoError, Result};

/// Default number of work units between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 20;

/// Cancellation token shared with the worker thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    pub fn new() -> Self { Self(Arc::new(AtomicBool::new(false))) }
    pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst); }
    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

/// A progress notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Status(String),
    /// Units done so far, out of `total`.
    Count { done: usize, total: usize },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Progress::Status(s) => write!(f, "{}", s),
            Progress::Count { done, total } => write!(f, "{}/{}", done, total),
        }
    }
}

pub type ProgressSink = Arc<dyn Fn(Progress) + Send + Sync>;

/// Cancellation and progress reporting for one analysis call.
#[derive(Clone)]
pub struct AnalysisContext {
    cancel: CancelToken,
    progress: Option<ProgressSink>,
    interval: usize,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self { cancel: CancelToken::new(), progress: None, interval: DEFAULT_PROGRESS_INTERVAL }
    }
}

impl fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("progress", &self.progress.is_some())
            .field("interval", &self.interval)
            .finish()
    }
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
    pub fn with_progress(mut self, sink: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }
    /// Values below 1 are treated as 1.
    pub fn with_interval(mut self, interval: usize) -> Self {
        self.interval = interval.max(1);
        self
    }
    pub fn interval(&self) -> usize {
        self.interval
    }
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
    pub fn status(&self, message: &str) {
        if let Some(sink) = &self.progress {
            sink(Progress::Status(message.to_string()));
        }
    }
    /// Reports unconditionally.
    pub fn report(&self, done: usize, total: usize) {
        if let Some(sink) = &self.progress {
            sink(Progress::Count { done, total });
        }
    }
    /// Reports only on multiples of the interval.
    pub fn tick(&self, done: usize, total: usize) {
        if done % self.interval == 0 {
            self.report(done, total);
        }
    }
}

/// Opaque analysis identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisId(u64);

/// What a running analysis tells its caller.
#[derive(Debug)]
pub enum AnalysisEvent<T> {
    Progress(Progress),
    Finished(T),
    Cancelled,
    Failed(PhonoError),
}

/// Handle to a running or completed analysis.
pub struct AnalysisHandle<T> {
    pub id: AnalysisId,
    cancel: CancelToken,
    started: Instant,
    join: Option<JoinHandle<()>>,
    pub events: Receiver<AnalysisEvent<T>>,
}

impl<T> AnalysisHandle<T> {
    /// Request cancellation (cooperative).
    pub fn cancel(&self) { self.cancel.cancel(); }
    /// Elapsed time since start.
    pub fn elapsed(&self) -> Duration { self.started.elapsed() }

    /// Waits for the worker and returns its final event, skipping progress.
    pub fn join(mut self) -> AnalysisEvent<T> {
        let mut last = AnalysisEvent::Failed(PhonoError::Worker("the analysis ended without a result".into()));
        for event in self.events.iter() {
            if !matches!(event, AnalysisEvent::Progress(_)) {
                last = event;
            }
        }
        if let Some(j) = self.join.take() {
            if j.join().is_err() {
                return AnalysisEvent::Failed(PhonoError::Worker("the analysis thread panicked".into()));
            }
        }
        last
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Registry running analyses over one shared corpus.
pub struct AnalysisRunner {
    corpus: Arc<Corpus>,
    interval: usize,
    next_id: Mutex<u64>,
    active: Arc<Mutex<HashMap<AnalysisId, CancelToken>>>,
}

impl AnalysisRunner {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus, interval: DEFAULT_PROGRESS_INTERVAL, next_id: Mutex::new(0), active: Arc::default() }
    }

    pub fn with_interval(mut self, interval: usize) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    fn allocate_id(&self) -> Result<AnalysisId> {
        let mut g = self.next_id.lock().map_err(|e| PhonoError::Lock(e.to_string()))?;
        *g += 1;
        Ok(AnalysisId(*g))
    }

    /// Runs `job` on a background thread. The job returns `Ok(None)` when it
    /// observed cancellation. Panics are caught and reported as failures.
    pub fn spawn<T, F>(&self, job: F) -> Result<AnalysisHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Corpus, &AnalysisContext) -> Result<Option<T>> + Send + 'static,
    {
        let id = self.allocate_id()?;
        let cancel = CancelToken::new();
        self.active
            .lock()
            .map_err(|e| PhonoError::Lock(e.to_string()))?
            .insert(id, cancel.clone());

        let (tx, rx): (Sender<AnalysisEvent<T>>, Receiver<AnalysisEvent<T>>) = mpsc::channel();
        let progress_tx = tx.clone();
        let context = AnalysisContext::new()
            .with_cancel(cancel.clone())
            .with_interval(self.interval)
            .with_progress(move |p| {
                let _ = progress_tx.send(AnalysisEvent::Progress(p));
            });

        let corpus = Arc::clone(&self.corpus);
        let active = Arc::clone(&self.active);
        let join = std::thread::spawn(move || {
            let started = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&corpus, &context)));
            let event = match outcome {
                Ok(Ok(Some(value))) => {
                    info!(id = id.0, ms = started.elapsed().as_secs_f64() * 1000.0, "analysis finished");
                    AnalysisEvent::Finished(value)
                }
                Ok(Ok(None)) => {
                    info!(id = id.0, ms = started.elapsed().as_secs_f64() * 1000.0, "analysis cancelled");
                    AnalysisEvent::Cancelled
                }
                Ok(Err(e)) => {
                    warn!(id = id.0, error = %e, "analysis failed");
                    AnalysisEvent::Failed(e)
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(id = id.0, %message, "analysis panicked");
                    AnalysisEvent::Failed(PhonoError::Worker(message))
                }
            };
            if let Ok(mut active) = active.lock() {
                active.remove(&id);
            }
            let _ = tx.send(event);
        });

        Ok(AnalysisHandle { id, cancel, started: Instant::now(), join: Some(join), events: rx })
    }

    /// Cancel an analysis by id.
    pub fn cancel(&self, id: AnalysisId) -> bool {
        match self.active.lock() {
            Ok(active) => match active.get(&id) {
                Some(tok) => {
                    tok.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Number of analyses that have not yet produced their final event.
    pub fn active(&self) -> usize {
        self.active.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// Stop tracking a running analysis; its id no longer cancels anything.
    /// Finished analyses are dropped automatically.
    pub fn forget(&self, id: AnalysisId) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&id);
        }
    }
}
