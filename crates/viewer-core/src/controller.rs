//! Background analysis task management.
//!
//! [`AnalysisController`] runs an [`EngineSession`] on a dedicated thread,
//! feeding its updates through an [`AnalysisQueue`] into a sink. Stopping is
//! cooperative: a [`CancelToken`] is set, the session is interrupted so a
//! blocked read returns, and the thread is joined before `stop` returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use shakmaty::Chess;

use crate::analysis::{AnalysisQueue, AnalysisSink, MULTI_PV};
use crate::engine::{EngineSession, Interrupter};
use crate::error::Result;

/// Cooperative cancellation flag with interrupt hooks.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    hooks: Mutex<Vec<Interrupter>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Sets the flag, then runs the registered hooks once.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let hooks: Vec<Interrupter> = self
            .inner
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for hook in hooks {
            hook();
        }
    }

    /// Registers `hook` to run on cancellation; runs it now if already
    /// cancelled.
    pub fn on_cancel(&self, hook: Interrupter) {
        if self.is_cancelled() {
            hook();
            return;
        }
        self.inner
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A running analysis thread.
struct AnalysisTask<E> {
    handle: JoinHandle<E>,
    token: CancelToken,
    started: Instant,
}

/// Owns an engine session and runs at most one analysis at a time.
///
/// While idle the controller holds the session. [`start`] moves it onto a
/// background thread and [`stop`] joins that thread and takes it back, so
/// the same session serves every analysis.
///
/// [`start`]: AnalysisController::start
/// [`stop`]: AnalysisController::stop
pub struct AnalysisController<E: EngineSession + 'static> {
    engine: Option<E>,
    task: Option<AnalysisTask<E>>,
}

impl<E: EngineSession + 'static> AnalysisController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Some(engine),
            task: None,
        }
    }

    /// Whether an analysis thread is still running.
    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Whether an analysis was started and not yet stopped, even if its
    /// thread already finished.
    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// The idle engine session, if no analysis holds it.
    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Starts analysing `position` in the background, showing batches in
    /// `sink`.
    ///
    /// The sink is cleared first. Returns `false` without doing anything if
    /// an analysis is already running or the session was lost.
    pub fn start<S>(&mut self, position: &Chess, mut sink: S) -> bool
    where
        S: AnalysisSink + 'static,
    {
        if self.is_running() {
            debug!("analysis already running");
            return false;
        }
        self.reap();

        let Some(mut engine) = self.engine.take() else {
            warn!("no engine session available for analysis");
            return false;
        };

        let token = CancelToken::new();
        if let Some(interrupt) = engine.interrupter() {
            token.on_cancel(interrupt);
        }

        sink.clear();
        let position = position.clone();
        let task_token = token.clone();
        let handle = thread::spawn(move || {
            run_analysis(&mut engine, &position, sink, &task_token);
            engine
        });

        self.task = Some(AnalysisTask {
            handle,
            token,
            started: Instant::now(),
        });
        debug!("analysis started");
        true
    }

    /// Stops the running analysis and waits for its thread to finish.
    ///
    /// Returns how long stopping took, or `None` if nothing was running.
    pub fn stop(&mut self) -> Option<Duration> {
        let task = self.task.take()?;
        let begin = Instant::now();
        task.token.cancel();
        self.join(task);
        let elapsed = begin.elapsed();
        info!("{:.3} seconds taken to stop analysis", elapsed.as_secs_f64());
        Some(elapsed)
    }

    /// Joins a thread that already finished on its own.
    fn reap(&mut self) {
        if let Some(task) = self.task.take() {
            self.join(task);
        }
    }

    fn join(&mut self, task: AnalysisTask<E>) {
        match task.handle.join() {
            Ok(engine) => {
                debug!(
                    "analysis ran for {:.3} seconds",
                    task.started.elapsed().as_secs_f64()
                );
                self.engine = Some(engine);
            }
            Err(_) => error!("analysis thread panicked; engine session lost"),
        }
    }

    /// Stops any analysis and returns the engine session.
    pub fn into_engine(mut self) -> Option<E> {
        self.stop();
        self.engine.take()
    }
}

impl<E: EngineSession + 'static> Drop for AnalysisController<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the analysis thread.
fn run_analysis<E, S>(engine: &mut E, position: &Chess, sink: S, token: &CancelToken)
where
    E: EngineSession,
    S: AnalysisSink,
{
    let mut queue = AnalysisQueue::new(sink);
    match stream_updates(engine, position, &mut queue, token) {
        Ok(()) => debug!("analysis stream ended"),
        Err(e) if e.is_disconnect() => debug!("analysis session closed: {e}"),
        Err(e) => warn!("analysis failed: {e}"),
    }
    if let Err(e) = engine.stop_analysis() {
        debug!("failed to stop engine analysis: {e}");
    }
}

fn stream_updates<E, S>(
    engine: &mut E,
    position: &Chess,
    queue: &mut AnalysisQueue<S>,
    token: &CancelToken,
) -> Result<()>
where
    E: EngineSession,
    S: AnalysisSink,
{
    engine.start_analysis(position, MULTI_PV)?;
    while !token.is_cancelled() {
        let Some(update) = engine.next_update()? else {
            break;
        };
        queue.add(&update, position);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_cancel_runs_hooks_once() {
        let token = CancelToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        token.on_cancel(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!token.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_registered_after_cancel_runs_immediately() {
        let token = CancelToken::new();
        token.cancel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        token.on_cancel(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
    }
}
