#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use recent_changes::recent_cmd;

#[derive(Parser, Debug)]
#[command(name = "recent-changes")]
#[command(about = "Write a page listing the most recently changed content files", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set RECENT_CHANGES_LOG)
    #[arg(long)]
    verbose: bool,

    /// Any directory inside the repository
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// TOML config file (default: recent-changes.toml at the repository root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the listed changes as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("RECENT_CHANGES_LOG").unwrap_or_else(|_| {
        if verbose { "recent_changes=debug".to_string() } else { "recent_changes=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match recent_cmd::run(cli.repo, cli.config, cli.json) {
        Ok(out) => println!("Wrote: {}", out.display()),
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}
