//! Non-interactive output: the history window and timed analysis.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use colored::Colorize;
use viewer_core::history::{format_move_history, history_window};
use viewer_core::{
    AnalysisController, AnalysisLine, GameTree, MoveCursor, NodeId, UciEngine, VariationPath,
};

/// Mainline node at `ply`, or the last mainline node if the game is shorter.
fn mainline_node(tree: &GameTree, ply: u32) -> NodeId {
    tree.visible_nodes(&VariationPath::new())
        .take_while(|&id| tree.ply(id) <= ply)
        .last()
        .unwrap_or_else(|| tree.root())
}

/// Prints the 15-row history window of the mainline with the cursor at `ply`.
pub fn print_history(tree: &GameTree, ply: Option<u32>) {
    let node = match ply {
        Some(ply) => mainline_node(tree, ply),
        None => tree.mainline_end(),
    };
    let cursor = MoveCursor::from_ply(tree.ply(node));
    let path = VariationPath::new();
    let lines = format_move_history(tree, tree.visible_nodes(&path), cursor);

    for row in history_window(&lines, cursor) {
        if row.is_blank() {
            println!();
        } else if row.current {
            println!("{}", format!("> {}", row.text).black().on_white().bold());
        } else if row.branch {
            println!("  {}", row.text.yellow());
        } else {
            println!("  {}", row.text);
        }
    }

    if let Some(parent) = tree.parent(node) {
        let alternatives: Vec<String> = tree
            .variations(parent)
            .iter()
            .map(|&id| tree.variation_label(id))
            .collect();
        if alternatives.len() > 1 {
            println!("{} {}", "Variations:".cyan(), alternatives.join(", "));
        }
    }
}

fn print_batch(elapsed: Duration, batch: &[AnalysisLine]) {
    println!("{}", format!("[{:6.2}s]", elapsed.as_secs_f64()).dimmed());
    for (i, line) in batch.iter().enumerate() {
        let score = if line.score.starts_with('-') || line.score.starts_with("#-") {
            line.score.red()
        } else {
            line.score.green()
        };
        println!("  {} {:>6} {:>3} {}", i + 1, score, line.depth, line.san);
    }
}

/// Analyses the mainline position at `ply` for `seconds` and prints each
/// batch of lines as it arrives.
pub fn analyse(tree: &GameTree, ply: u32, engine: UciEngine, seconds: f64) -> Result<(), String> {
    let duration = Duration::try_from_secs_f64(seconds).map_err(|e| e.to_string())?;
    let node = mainline_node(tree, ply);
    let position = tree.position(node);
    let mut controller = AnalysisController::new(engine);
    let (sink, batches) = mpsc::channel();

    println!(
        "{} {}",
        "Analysing after".cyan(),
        match tree.variation_label(node).as_str() {
            "" => "the start position".to_string(),
            label => label.to_string(),
        }
    );
    if !controller.start(position, sink) {
        return Err("analysis could not be started".to_string());
    }

    let begin = Instant::now();
    while let Some(remaining) = duration.checked_sub(begin.elapsed()) {
        match batches.recv_timeout(remaining) {
            Ok(batch) => print_batch(begin.elapsed(), &batch),
            Err(mpsc::RecvTimeoutError::Timeout) => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                println!("{}", "Engine finished the analysis.".dimmed());
                break;
            }
        }
    }

    if let Some(elapsed) = controller.stop() {
        println!(
            "{}",
            format!("Stopped in {:.3}s", elapsed.as_secs_f64()).dimmed()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use viewer_core::movetext;

    use super::*;

    #[test]
    fn test_mainline_node() {
        let tree = movetext::parse("1. e4 e5 (1... c5) 2. Nf3", Default::default()).unwrap();
        assert_eq!(mainline_node(&tree, 0), tree.root());
        assert_eq!(tree.san(mainline_node(&tree, 2)), "e5");
        assert_eq!(tree.san(mainline_node(&tree, 99)), "Nf3");
    }
}
