mod engine;
mod game;
mod print;
mod tui;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
struct EngineParams {
    /// Command for the UCI engine (program path and arguments)
    #[arg(short, long)]
    engine: Option<String>,

    /// Working directory for the engine process
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    engine_working_dir: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct GameParams {
    /// Starting position as FEN
    #[arg(long)]
    fen: Option<String>,

    /// Movetext with parenthesised variations, e.g. "1. e4 e5 (1... c5) 2. Nf3"
    #[arg(short, long)]
    moves: Option<String>,

    /// Read the movetext from a file instead
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath, conflicts_with = "moves")]
    moves_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Chess game viewer with variation browsing and engine analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<SubCommands>,

    #[command(flatten)]
    engine_params: EngineParams,

    #[command(flatten)]
    game_params: GameParams,

    /// Draw the variation rows even while the menu is closed
    #[arg(long)]
    always_variation: bool,

    /// Write log output to this file
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Print the move history window of the mainline
    Print {
        /// Ply to place the cursor at (defaults to the end of the mainline)
        #[arg(long)]
        ply: Option<u32>,
    },
    /// Analyse a mainline position and print each batch of lines
    Analyse {
        /// How long to analyse
        #[arg(long, default_value = "5")]
        seconds: f64,

        /// Ply of the mainline position to analyse
        #[arg(long, default_value = "0")]
        ply: u32,
    },
}

fn main() {
    let args = Cli::parse();

    // Without a log file the terminal UI owns stderr, so logging stays off.
    if (args.command.is_some() || args.log_file.is_some())
        && let Err(e) = init_logging(args.log_file.as_deref())
    {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let tree = game::load(&args.game_params).unwrap_or_else(|err| {
        eprintln!("Failed to load game: {err}");
        std::process::exit(1);
    });

    match args.command {
        Some(SubCommands::Print { ply }) => {
            print::print_history(&tree, ply);
        }
        Some(SubCommands::Analyse { seconds, ply }) => {
            let Some(engine) = engine::spawn(&args.engine_params).unwrap_or_else(|err| {
                eprintln!("Failed to start engine: {err}");
                std::process::exit(1);
            }) else {
                eprintln!("The analyse command needs --engine");
                std::process::exit(1);
            };
            if let Err(e) = print::analyse(&tree, ply, engine, seconds) {
                eprintln!("Error during analysis: {e}");
            }
        }
        None => {
            let engine = engine::spawn(&args.engine_params).unwrap_or_else(|err| {
                eprintln!("Failed to start engine: {err}");
                std::process::exit(1);
            });
            ui::ui_loop(tree, engine, args.always_variation).unwrap_or_else(|err| {
                eprintln!("Failed to run UI: {err}");
            });
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<(), String> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = File::create(path)
            .map_err(|e| format!("cannot create log file {}: {e}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().map_err(|e| e.to_string())
}
