//! Doctor command - verify API keys, storage and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Coursemate Doctor");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let generation_key = settings.generation.provider.api_key_env();
    let mut api_checks = vec![check_api_key(generation_key, std::env::var(generation_key).ok())];
    if generation_key != "OPENAI_API_KEY" {
        api_checks.push(check_api_key("OPENAI_API_KEY", std::env::var("OPENAI_API_KEY").ok()));
    }
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);
    Output::kv(
        "Model",
        &format!("{} ({})", settings.generation.model, settings.generation.provider),
    );

    println!();

    println!("{}", style("Storage").bold());
    let storage_checks = check_storage(settings);
    for check in &storage_checks {
        check.print();
    }
    checks.extend(storage_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Coursemate.",
            errors
        ));
        anyhow::bail!("{} doctor check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Coursemate is ready to use.");
    }

    Ok(())
}

fn check_api_key(var: &str, value: Option<String>) -> CheckResult {
    let hint = format!("Set with: export {}='...'", var);
    match value {
        Some(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Some(key) if key.chars().count() > 12 => {
            CheckResult::ok(var, &format!("configured ({})", mask_key(&key)))
        }
        Some(_) => CheckResult::warning(var, "set but looks too short", &hint),
        None => CheckResult::error(var, "not set", &hint),
    }
}

fn mask_key(key: &str) -> String {
    let head: String = key.chars().take(4).collect();
    let mut tail: Vec<char> = key.chars().rev().take(4).collect();
    tail.reverse();
    format!("{}...{}", head, tail.into_iter().collect::<String>())
}

fn check_storage(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let docs_dir = settings.docs_dir();
    if docs_dir.is_dir() {
        results.push(CheckResult::ok("Course documents", &docs_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Course documents",
            &format!("{} (missing)", docs_dir.display()),
            "Create it and add .txt course files, or pass a folder to 'coursemate ingest'",
        ));
    }

    if settings.vector_store.provider == "memory" {
        results.push(CheckResult::warning(
            "Database",
            "in-memory store",
            "Indexed courses are lost when the process exits",
        ));
        return results;
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Database",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created on first ingest",
        ));
    }

    results
}

fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: coursemate config edit",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
