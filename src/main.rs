//! glide - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use glide::config::Config;
use glide::git::index_repository;

/// Split a dirty working tree into one AI-described commit per file.
#[derive(Parser, Debug)]
#[command(name = "glide")]
#[command(about = "Split a dirty working tree into one AI-described commit per file")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Commit every changed file separately with a generated message
    SplitCommit {
        /// Any directory inside the repository
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },

    /// Print the per-file history records a vector store would index
    Index {
        /// Any directory inside the repository
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Emit one JSON object per line instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    // stdout carries the result; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glide=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::SplitCommit { repo } => {
            let config = Config::from_env();
            let result = glide::split_commit(&repo, &config).await;
            println!("{}", result);
        }
        Command::Index { repo, json } => {
            let rows = tokio::task::spawn_blocking(move || index_repository(&repo))
                .await
                .context("History walk panicked")?
                .context("Failed to read repository history")?;

            for (branch, diff) in &rows {
                if json {
                    let line = serde_json::json!({ "branch": branch, "diff": diff });
                    println!("{}", line);
                } else {
                    println!(
                        "{} {} {} {} +{} -{} {}",
                        branch,
                        diff.short_id,
                        diff.status,
                        diff.file_path(),
                        diff.additions,
                        diff.deletions,
                        diff.message.lines().next().unwrap_or("")
                    );
                }
            }
            eprintln!("{} file change(s) across local branches", rows.len());
        }
    }

    Ok(())
}
