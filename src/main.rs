//! Lemonade - terminal companion for the Argon Roblox sync CLI
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use lemonade::host::HostOptions;

/// Lemonade - drive Argon sessions for a Roblox workspace
#[derive(Parser, Debug)]
#[command(name = "lemonade", version)]
#[command(about = "Terminal companion for the Argon Roblox sync CLI", long_about = None)]
struct Args {
    /// Workspace folder (defaults to the current directory)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Do not restore the sessions that were running last time
    #[arg(long)]
    no_restore: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let path = args
        .path
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let workspace = dunce::canonicalize(&path).unwrap_or(path);

    let options = HostOptions {
        restore: !args.no_restore,
    };

    lemonade::host::run(&workspace, options).await?;
    Ok(())
}
