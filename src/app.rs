//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use crate::setup;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Terminal waveform viewer with a playback-synchronized cursor
#[derive(Parser)]
#[command(name = "wavescope")]
#[command(version)]
#[command(about = "Terminal waveform viewer with a playback-synchronized cursor")]
#[command(long_about = "Terminal waveform viewer with a playback-synchronized cursor.\n\nDraws the min/max envelope of each channel at the resolution of your terminal\nand moves a cursor along with playback. WAV files are read directly; other\nformats are converted with ffmpeg.\n\nDEFAULT COMMAND:\n    Files given without a command are opened in the viewer.\n\nEXAMPLES:\n    # View one or more files (n/p switches between them)\n    $ wavescope take1.wav take2.flac\n    \n    # Print a 120-column envelope as JSON\n    $ wavescope peaks take1.wav --width 120 --json\n    \n    # Show sample rate, channels and duration\n    $ wavescope info take1.wav\n    \n    # Edit configuration file\n    $ wavescope config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/wavescope/wavescope.toml\n    Logs:               ~/.local/state/wavescope/wavescope.log.*"
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(flatten)]
    view: ViewArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
struct ViewArgs {
    /// Audio files to open
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Move the cursor without playing audio
    #[arg(short, long)]
    mute: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open files in the interactive viewer (default)
    ///
    /// Space plays/pauses, Left/Right seek, +/- zoom, n/p switch files,
    /// Home jumps to the start, q/Esc quits. Click the waveform to seek.
    #[command(visible_alias = "v")]
    View(ViewArgs),

    /// Print the min/max envelope of a file
    ///
    /// One row per column and channel: column, channel, min, max.
    /// Columns without samples print '-'.
    Peaks {
        /// Audio file to analyze
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of columns
        #[arg(short, long, default_value_t = 100)]
        width: usize,

        /// Zoom factor; 1 fits the whole file into the width
        #[arg(short, long, default_value_t = 1)]
        zoom: u32,

        /// Only print this channel (0-based)
        #[arg(short, long)]
        channel: Option<usize>,

        /// Print JSON instead of tab-separated text
        #[arg(long)]
        json: bool,
    },

    /// Show format, length and peak level of a file
    #[command(visible_alias = "i")]
    Info {
        /// Audio file to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   wavescope completions bash > wavescope.bash
    ///   wavescope completions zsh > _wavescope
    ///   wavescope completions fish > wavescope.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "wavescope", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Logs) => {
            if let Err(e) = commands::handle_logs() {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            return Ok(());
        }
        _ => {}
    }

    logging::init_logging()?;

    setup::ensure_config().map_err(|e| {
        tracing::error!("Setup failed: {e}");
        anyhow::anyhow!("Setup failed: {e}")
    })?;

    match cli.command {
        None => {
            if cli.view.files.is_empty() {
                Cli::command().print_help()?;
                return Ok(());
            }
            commands::handle_view(cli.view.files, cli.view.mute).await?;
        }
        Some(Commands::View(args)) => {
            commands::handle_view(args.files, args.mute).await?;
        }
        Some(Commands::Peaks {
            file,
            width,
            zoom,
            channel,
            json,
        }) => {
            commands::handle_peaks(file, width, zoom, channel, json).await?;
        }
        Some(Commands::Info { file }) => {
            commands::handle_info(file).await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
