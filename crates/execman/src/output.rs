//! Terminal output for command results
//!
//! Results go to stdout; warnings, errors and spinners go to stderr so piped
//! output stays clean.

use console::style;
use execman_update::PipelineFailure;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Indented detail line under a result, keys aligned
pub fn kv(key: &str, value: &str) {
    println!("  {:<10} {}", style(format!("{}:", key)).dim(), value);
}

/// One name in a batch that stopped at a pipeline stage
pub fn stage_failure(name: &str, failure: &PipelineFailure) {
    eprintln!(
        "{} {} {} {}",
        style("✗").red().bold(),
        style(name).bold(),
        style(format!("[{}]", failure.stage)).dim(),
        failure.error
    );
}

/// Spinner on stderr; hidden automatically when stderr is not a terminal
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}") {
        pb.set_style(style.tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷ "));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
