use std::path::PathBuf;

use clap::Parser;
use codeplay_cli::host::EDIT_MODE_ENV;
use codeplay_cli::Options;
use codeplay_vfs::Language;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// codeplay - a multi-language code playground in the terminal
#[derive(Parser, Debug)]
#[command(name = "codeplay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory for workspaces, history and config.json
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Language to start in (python, javascript, clojure)
    #[arg(long, short)]
    language: Option<Language>,

    /// Delete every saved workspace before starting
    #[arg(long)]
    reset: bool,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long)]
    memory: bool,

    /// Force vi editing mode
    #[arg(long, conflicts_with = "emacs")]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.vi {
        std::env::set_var(EDIT_MODE_ENV, "vi");
    } else if args.emacs {
        std::env::set_var(EDIT_MODE_ENV, "emacs");
    }

    let options = Options {
        data_dir: args.data_dir,
        language: args.language,
        reset: args.reset,
        memory: args.memory,
    };

    if let Err(e) = codeplay_cli::run(options) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
