//! Engine process setup from command-line options.

use log::info;
use viewer_core::UciEngine;

use crate::EngineParams;

/// Starts the configured UCI engine, if any.
///
/// # Errors
///
/// Returns an error message if the command is empty or the engine fails to
/// start or complete its handshake.
pub fn spawn(params: &EngineParams) -> Result<Option<UciEngine>, String> {
    let Some(command) = params.engine.as_deref() else {
        return Ok(None);
    };
    let (program, args) = parse_engine_command(command);
    if program.is_empty() {
        return Err("empty engine command".to_string());
    }

    let engine = UciEngine::new(&program, &args, params.engine_working_dir.clone())
        .map_err(|e| format!("{program}: {e}"))?;
    info!(
        "started engine {}",
        engine.name().unwrap_or(program.as_str())
    );
    Ok(Some(engine))
}

/// Splits an engine command into the program and its arguments using
/// shell-like quoting rules.
pub fn parse_engine_command(cmd: &str) -> (String, Vec<String>) {
    match shlex::split(cmd) {
        Some(parts) if !parts.is_empty() => {
            let program = parts[0].clone();
            let args = parts[1..].to_vec();
            (program, args)
        }
        _ => {
            // Fallback to simple whitespace splitting if shlex fails
            let parts: Vec<&str> = cmd.split_whitespace().collect();
            match parts.split_first() {
                Some((program, args)) => (
                    program.to_string(),
                    args.iter().map(|s| s.to_string()).collect(),
                ),
                None => (String::new(), Vec::new()),
            }
        }
    }
}
