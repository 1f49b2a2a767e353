//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an answer followed by its numbered citations.
    pub fn answer(answer: &str, sources: &[String]) {
        println!("\n{}\n", answer);

        if !sources.is_empty() {
            Output::header("Sources");
            for (i, source) in sources.iter().enumerate() {
                println!("  {} {}", style(format!("[{}]", i + 1)).cyan(), plain_source(source));
            }
            println!();
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Render an HTML anchor source as `label (url)` for the terminal.
pub(crate) fn plain_source(source: &str) -> String {
    let Some(rest) = source.strip_prefix("<a href=\"") else {
        return source.to_string();
    };
    let Some((href, rest)) = rest.split_once('"') else {
        return source.to_string();
    };
    let label = rest
        .split_once('>')
        .map(|(_, tail)| tail.trim_end_matches("</a>"))
        .unwrap_or(rest);
    format!("{} ({})", label, href)
}
