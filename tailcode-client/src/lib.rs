pub mod cli;
pub mod config;
pub mod discover;
pub mod notify;
pub mod ssh;
pub mod tailscale;
pub mod util;
pub mod webhook;
pub mod wol;

#[cfg(test)]
mod testing;

/// Entrypoint used by `main.rs`; returns the process exit code.
pub async fn run_cli() -> anyhow::Result<i32> {
    cli::cli().await
}
