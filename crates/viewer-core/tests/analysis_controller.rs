use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use shakmaty::Chess;
use viewer_core::engine::{AnalysisUpdate, EngineSession, Interrupter, Score};
use viewer_core::{AnalysisController, AnalysisLine, Result, SharedLines, ViewerError};

const TIMEOUT: Duration = Duration::from_secs(5);

enum Message {
    Update(AnalysisUpdate),
    End,
    Wake,
}

/// Engine whose output is fed by the test through a channel.
struct ScriptedEngine {
    messages: Receiver<Message>,
    wake: Sender<Message>,
    started: Sender<()>,
    stops: Arc<AtomicUsize>,
}

struct Harness {
    feed: Sender<Message>,
    started: Receiver<()>,
    stops: Arc<AtomicUsize>,
}

impl Harness {
    fn wait_started(&self) {
        self.started
            .recv_timeout(TIMEOUT)
            .expect("analysis did not start");
    }

    fn send_cp(&self, cp: i32) {
        self.feed
            .send(Message::Update(AnalysisUpdate {
                score: Some(Score::Cp(cp)),
                depth: 10,
                multipv: 1,
                pv: Vec::new(),
            }))
            .unwrap();
    }
}

fn scripted() -> (ScriptedEngine, Harness) {
    let (feed, messages) = mpsc::channel();
    let (started_tx, started_rx) = mpsc::channel();
    let stops = Arc::new(AtomicUsize::new(0));
    let engine = ScriptedEngine {
        messages,
        wake: feed.clone(),
        started: started_tx,
        stops: Arc::clone(&stops),
    };
    let harness = Harness {
        feed,
        started: started_rx,
        stops,
    };
    (engine, harness)
}

impl EngineSession for ScriptedEngine {
    fn start_analysis(&mut self, _position: &Chess, _multipv: usize) -> Result<()> {
        // drop wake-ups left over from the previous analysis
        while self.messages.try_recv().is_ok() {}
        let _ = self.started.send(());
        Ok(())
    }

    fn next_update(&mut self) -> Result<Option<AnalysisUpdate>> {
        match self.messages.recv() {
            Ok(Message::Update(update)) => Ok(Some(update)),
            Ok(Message::End | Message::Wake) => Ok(None),
            Err(_) => Err(ViewerError::Closed),
        }
    }

    fn stop_analysis(&mut self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn interrupter(&self) -> Option<Interrupter> {
        let wake = self.wake.clone();
        Some(Box::new(move || {
            let _ = wake.send(Message::Wake);
        }))
    }

    fn quit(&mut self) -> Result<()> {
        Ok(())
    }
}

fn scores(lines: &[AnalysisLine]) -> Vec<String> {
    lines.iter().map(|line| line.score.clone()).collect()
}

fn wait_for_lines(shared: &SharedLines, count: usize) -> Vec<AnalysisLine> {
    let deadline = Instant::now() + TIMEOUT;
    loop {
        let lines = shared.snapshot();
        if lines.len() == count || Instant::now() > deadline {
            return lines;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_stop_interrupts_blocked_read() {
    let (engine, harness) = scripted();
    let mut controller = AnalysisController::new(engine);
    let (sink, batches) = mpsc::channel();

    assert!(controller.start(&Chess::default(), sink));
    harness.wait_started();
    for cp in [30, 20, 10] {
        harness.send_cp(cp);
    }
    let batch = batches.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(scores(&batch), ["+30", "+20", "+10"]);
    assert!(controller.is_running());

    let elapsed = controller.stop().expect("analysis was running");
    assert!(elapsed < TIMEOUT);
    assert!(!controller.is_running());
    assert!(controller.engine().is_some());
    assert_eq!(harness.stops.load(Ordering::SeqCst), 1);
    assert_eq!(controller.stop(), None);
}

#[test]
fn test_session_is_reused_after_stop() {
    let (engine, harness) = scripted();
    let mut controller = AnalysisController::new(engine);

    for _ in 0..3 {
        assert!(controller.start(&Chess::default(), SharedLines::new()));
        harness.wait_started();
        assert!(controller.stop().is_some());
    }
    assert_eq!(harness.stops.load(Ordering::SeqCst), 3);
}

#[test]
fn test_restart_shows_only_new_lines() {
    let (engine, harness) = scripted();
    let mut controller = AnalysisController::new(engine);
    let shared = SharedLines::new();

    assert!(controller.start(&Chess::default(), shared.clone()));
    harness.wait_started();
    for cp in [1, 2, 3, 4, 5] {
        harness.send_cp(cp);
    }
    assert_eq!(scores(&wait_for_lines(&shared, 3)), ["+1", "+2", "+3"]);
    controller.stop();

    assert!(controller.start(&Chess::default(), shared.clone()));
    assert!(shared.snapshot().is_empty());
    harness.wait_started();
    for cp in [7, 8, 9] {
        harness.send_cp(cp);
    }
    assert_eq!(scores(&wait_for_lines(&shared, 3)), ["+7", "+8", "+9"]);
    controller.stop();
}

#[test]
fn test_start_while_running_is_rejected() {
    let (engine, harness) = scripted();
    let mut controller = AnalysisController::new(engine);

    assert!(controller.start(&Chess::default(), SharedLines::new()));
    harness.wait_started();
    assert!(!controller.start(&Chess::default(), SharedLines::new()));
    controller.stop();
}

#[test]
fn test_finished_analysis_is_reaped_on_start() {
    let (engine, harness) = scripted();
    let mut controller = AnalysisController::new(engine);

    assert!(controller.start(&Chess::default(), SharedLines::new()));
    harness.wait_started();
    harness.feed.send(Message::End).unwrap();

    let deadline = Instant::now() + TIMEOUT;
    while controller.is_running() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(!controller.is_running());
    assert!(controller.is_active());

    assert!(controller.start(&Chess::default(), SharedLines::new()));
    harness.wait_started();
    controller.stop();
    assert_eq!(harness.stops.load(Ordering::SeqCst), 2);
}

#[test]
fn test_drop_stops_running_analysis() {
    let (engine, harness) = scripted();
    let mut controller = AnalysisController::new(engine);

    assert!(controller.start(&Chess::default(), SharedLines::new()));
    harness.wait_started();
    drop(controller);
    assert_eq!(harness.stops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_into_engine_returns_session() {
    let (engine, harness) = scripted();
    let mut controller = AnalysisController::new(engine);

    assert!(controller.start(&Chess::default(), SharedLines::new()));
    harness.wait_started();
    assert!(controller.into_engine().is_some());
}
