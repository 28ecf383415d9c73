//! Progress display module
//!
//! Styled progress bars, status lines and summaries. Everything here writes to
//! stderr: in lookup mode stdout carries nothing but resolved plaintexts.

use crate::index::{LoadStats, LookupTable};
use bytesize::ByteSize;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════╗
║                                                              ║
║    ██████╗ ██████╗ ███╗   ██╗██████╗ ███████╗███╗   ██╗      ║
║   ██╔════╝██╔═══██╗████╗  ██║██╔══██╗██╔════╝████╗  ██║      ║
║   ██║     ██║   ██║██╔██╗ ██║██║  ██║█████╗  ██╔██╗ ██║      ║
║   ██║     ██║   ██║██║╚██╗██║██║  ██║██╔══╝  ██║╚██╗██║      ║
║   ╚██████╗╚██████╔╝██║ ╚████║██████╔╝███████╗██║ ╚████║      ║
║    ╚═════╝ ╚═════╝ ╚═╝  ╚═══╝╚═════╝ ╚══════╝╚═╝  ╚═══╝      ║
║                                                              ║
║            Digest <-> Plaintext Lookup Tables (T3C)          ║
║                                               v1.0.0         ║
╚══════════════════════════════════════════════════════════════╝
"#;

    eprintln!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    eprintln!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    eprintln!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    eprintln!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    eprintln!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Print a bullet point
pub fn print_bullet(text: &str) {
    eprintln!("  {} {}", "•".green(), text);
}

/// Create a styled spinner for indeterminate progress
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();

    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Create a bytes-based progress bar
pub fn create_bytes_progress_bar(total_bytes: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);

    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.green/dim}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Report what a table load produced
pub fn print_load_summary(table: &LookupTable, stats: &LoadStats, elapsed: Duration) {
    print_success(&format!(
        "Loaded {} entries ({} algorithm) in {}",
        format_number(table.len() as u64),
        table.algorithm(),
        format_duration(elapsed)
    ));
    print_bullet(&format!("Records read:  {}", format_number(stats.loaded)));

    if stats.duplicates > 0 {
        print_bullet(&format!(
            "Duplicates:    {} (last occurrence kept)",
            format_number(stats.duplicates)
        ));
    }

    if stats.skipped > 0 {
        print_warning(&format!("Skipped {} malformed lines", format_number(stats.skipped)));
    }

    print_bullet(&format!("Index memory:  ~{}", ByteSize(table.memory_usage() as u64)));
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }
}
