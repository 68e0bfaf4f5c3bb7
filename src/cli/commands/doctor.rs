//! Doctor command - verify configuration and environment requirements.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{EpisodeStore, SqliteStore};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    message: String,
    hint: Option<String>,
}

#[derive(Debug, PartialEq)]
enum CheckStatus {
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
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Ordskifte Doctor");
    println!();
    println!("Checking configuration and environment...\n");

    let mut checks = Vec::new();

    println!("{}", style("Provider Keys").bold());
    checks.push(check_env_key(
        "DEEPGRAM_API_KEY",
        "needed for transcription",
    ));
    checks.push(check_env_key("OPENAI_API_KEY", "needed for embeddings and answers"));
    for check in &checks {
        check.print();
    }

    println!("\n{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    let audio_check = check_audio_dir(settings);
    audio_check.print();
    checks.push(audio_check);

    println!("\n{}", style("Database").bold());
    let db_check = check_database(settings).await;
    db_check.print();
    checks.push(db_check);

    println!();
    let errors = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Error)
        .count();
    let warnings = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Warning)
        .count();

    if errors > 0 {
        Output::error(&format!("{} check(s) failed", errors));
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s)", warnings));
    } else {
        Output::success("All checks passed");
    }

    Ok(())
}

fn check_env_key(name: &str, purpose: &str) -> CheckResult {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => CheckResult::ok(name, "set"),
        _ => CheckResult::error(
            name,
            &format!("not set ({})", purpose),
            &format!("export {}='...'", name),
        ),
    }
}

fn check_config_file() -> CheckResult {
    let path = Settings::default_config_path();
    if path.exists() {
        CheckResult::ok("config file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "config file",
            "not found, using defaults",
            "run 'ordskifte config edit' to create one",
        )
    }
}

fn check_audio_dir(settings: &Settings) -> CheckResult {
    let dir = settings.audio_dir();
    if dir.is_dir() {
        CheckResult::ok("audio directory", &format!("{}", dir.display()))
    } else {
        CheckResult::warning(
            "audio directory",
            &format!("{} does not exist", dir.display()),
            "create it and drop episode audio files inside",
        )
    }
}

async fn check_database(settings: &Settings) -> CheckResult {
    match SqliteStore::new(&settings.database_path()) {
        Ok(store) => match store.list_episodes().await {
            Ok(episodes) => {
                let processed = episodes.iter().filter(|e| e.is_processed).count();
                CheckResult::ok(
                    "database",
                    &format!("{} episode(s), {} processed", episodes.len(), processed),
                )
            }
            Err(e) => CheckResult::error(
                "database",
                &format!("query failed: {}", e),
                "run 'ordskifte seed <file> --reset' to rebuild the schema",
            ),
        },
        Err(e) => CheckResult::error(
            "database",
            &format!("cannot open: {}", e),
            "check the database path in your config",
        ),
    }
}
