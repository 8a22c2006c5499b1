//! UCI engine communication.
//!
//! This module provides the [`EngineSession`] abstraction the analysis
//! controller runs against, and [`UciEngine`], which drives an external
//! engine process over the UCI protocol. It handles process management,
//! the startup handshake, and parsing of `info` lines into updates.

use std::{
    fmt,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
    sync::{Arc, Mutex, PoisonError},
};

use log::{debug, trace};
use shakmaty::{Chess, EnPassantMode, fen::Fen, uci::UciMove};

use crate::error::{Result, ViewerError};

/// Engine evaluation from the point of view of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns
    Cp(i32),
    /// Moves until mate; negative when the side to move gets mated
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Score::Cp(0) => write!(f, "0"),
            Score::Cp(cp) => write!(f, "{cp:+}"),
            Score::Mate(moves) => write!(f, "#{moves:+}"),
        }
    }
}

/// One `info` report from an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisUpdate {
    pub score: Option<Score>,
    pub depth: u32,
    pub multipv: usize,
    pub pv: Vec<UciMove>,
}

/// Hook that interrupts a blocking [`EngineSession::next_update`] call from
/// another thread.
pub type Interrupter = Box<dyn FnOnce() + Send>;

/// A source of analysis updates for a position.
///
/// A session analyses one position at a time. [`next_update`] blocks until
/// the engine reports something and returns `Ok(None)` once the analysis has
/// ended.
///
/// [`next_update`]: EngineSession::next_update
pub trait EngineSession: Send {
    /// Starts analysing `position`, reporting `multipv` lines.
    fn start_analysis(&mut self, position: &Chess, multipv: usize) -> Result<()>;

    /// Waits for the next update of the running analysis.
    fn next_update(&mut self) -> Result<Option<AnalysisUpdate>>;

    /// Ends the running analysis, if any, and discards its remaining output.
    fn stop_analysis(&mut self) -> Result<()>;

    /// Returns a hook that makes a pending [`EngineSession::next_update`]
    /// return soon. Sessions that never block long return `None`.
    fn interrupter(&self) -> Option<Interrupter> {
        None
    }

    /// Shuts the engine down.
    fn quit(&mut self) -> Result<()>;
}

/// A UCI-compatible chess engine process.
///
/// This struct manages communication with an external engine that speaks
/// UCI. Its stdin is shared with the interrupter so that a `stop` can be sent
/// while another thread is blocked reading the engine's output.
pub struct UciEngine {
    process: Child,
    stdin: Arc<Mutex<ChildStdin>>,
    stdout: BufReader<ChildStdout>,
    name: Option<String>,
    multipv: Option<usize>,
    analysing: bool,
}

impl UciEngine {
    /// Create a new UCI engine instance.
    ///
    /// Starts the engine process with the specified executable, arguments and
    /// working directory, then performs the `uci` / `isready` handshake.
    ///
    /// # Arguments
    ///
    /// * `executable` - Path to the engine executable
    /// * `args` - Command-line arguments for the engine
    /// * `working_dir` - Optional working directory; defaults to the
    ///   executable's directory
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started or does not complete
    /// the handshake.
    pub fn new(executable: &str, args: &[String], working_dir: Option<PathBuf>) -> Result<Self> {
        let exec_path = Path::new(executable);
        let default_working_dir = match exec_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let working_dir = working_dir.unwrap_or(default_working_dir);

        let mut process = Command::new(executable)
            .args(args)
            .current_dir(&working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| ViewerError::Engine("Failed to open stdin".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| ViewerError::Engine("Failed to open stdout".to_string()))?;

        let mut engine = UciEngine {
            process,
            stdin: Arc::new(Mutex::new(stdin)),
            stdout: BufReader::new(stdout),
            name: None,
            multipv: None,
            analysing: false,
        };
        engine.handshake()?;
        Ok(engine)
    }

    /// Name the engine reported during the handshake.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Send a single command line to the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine's stdin is closed.
    pub fn send_command(&self, command: &str) -> Result<()> {
        trace!(">> {command}");
        let mut stdin = self.stdin.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(stdin, "{command}")?;
        stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let bytes_read = self.stdout.read_line(&mut line)?;
        if bytes_read == 0 {
            return Err(ViewerError::Closed);
        }
        let line = line.trim_end().to_string();
        trace!("<< {line}");
        Ok(line)
    }

    /// Reads lines until one starts with `token`.
    fn wait_for(&mut self, token: &str) -> Result<()> {
        loop {
            let line = self.read_line()?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = Some(name.trim().to_string());
            }
            if line.split_whitespace().next() == Some(token) {
                return Ok(());
            }
        }
    }

    fn handshake(&mut self) -> Result<()> {
        self.send_command("uci")?;
        self.wait_for("uciok")?;
        self.send_command("isready")?;
        self.wait_for("readyok")?;
        debug!(
            "engine ready: {}",
            self.name.as_deref().unwrap_or("(unnamed)")
        );
        Ok(())
    }
}

impl EngineSession for UciEngine {
    fn start_analysis(&mut self, position: &Chess, multipv: usize) -> Result<()> {
        if self.analysing {
            self.stop_analysis()?;
        }
        if self.multipv != Some(multipv) {
            self.send_command(&format!("setoption name MultiPV value {multipv}"))?;
            self.multipv = Some(multipv);
        }
        let fen = Fen::from_position(position.clone(), EnPassantMode::Legal);
        self.send_command(&format!("position fen {fen}"))?;
        self.send_command("isready")?;
        self.wait_for("readyok")?;
        self.send_command("go infinite")?;
        self.analysing = true;
        Ok(())
    }

    fn next_update(&mut self) -> Result<Option<AnalysisUpdate>> {
        while self.analysing {
            let line = self.read_line()?;
            if line.starts_with("bestmove") {
                self.analysing = false;
                break;
            }
            if let Some(update) = parse_info_line(&line) {
                return Ok(Some(update));
            }
        }
        Ok(None)
    }

    fn stop_analysis(&mut self) -> Result<()> {
        if !self.analysing {
            return Ok(());
        }
        self.send_command("stop")?;
        self.wait_for("bestmove")?;
        self.analysing = false;
        Ok(())
    }

    fn interrupter(&self) -> Option<Interrupter> {
        let stdin = Arc::clone(&self.stdin);
        Some(Box::new(move || {
            let mut stdin = stdin.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = writeln!(stdin, "stop");
            let _ = stdin.flush();
        }))
    }

    fn quit(&mut self) -> Result<()> {
        self.send_command("quit")
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.quit();
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Parses a UCI `info` line.
///
/// Returns `None` for lines that are not `info` lines, for `info string`
/// messages, and for reports that carry neither a score nor a PV.
pub fn parse_info_line(line: &str) -> Option<AnalysisUpdate> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "info" {
        return None;
    }

    let mut update = AnalysisUpdate {
        score: None,
        depth: 0,
        multipv: 1,
        pv: Vec::new(),
    };

    while let Some(token) = tokens.next() {
        match token {
            "depth" => update.depth = tokens.next()?.parse().ok()?,
            "multipv" => update.multipv = tokens.next()?.parse().ok()?,
            "score" => {
                let kind = tokens.next()?;
                let value: i32 = tokens.next()?.parse().ok()?;
                update.score = match kind {
                    "cp" => Some(Score::Cp(value)),
                    "mate" => Some(Score::Mate(value)),
                    _ => return None,
                };
            }
            "pv" => {
                update.pv = tokens
                    .by_ref()
                    .map_while(|token| token.parse::<UciMove>().ok())
                    .collect();
            }
            "string" => return None,
            _ => {}
        }
    }

    (update.score.is_some() || !update.pv.is_empty()).then_some(update)
}
