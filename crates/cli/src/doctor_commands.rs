//! `spamguard doctor`: config validation and database health.
//!
//! Prints a structured report with `[ok]`, `[warn]`, `[fail]`, or `[info]`
//! status indicators per item and exits non-zero when anything failed.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use {
    anyhow::Result,
    spamguard_config::{Severity, SpamguardConfig, ValidationResult},
    sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }

    fn count(&self, status: Status) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }
}

// ── Printing ────────────────────────────────────────────────────────────────

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
        }
        errors += section.count(Status::Fail);
        warnings += section.count(Status::Warn);
        eprintln!();
    }

    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_doctor(explicit: Option<&Path>) -> Result<()> {
    eprintln!("{BOLD}spamguard doctor{RESET}");
    eprintln!("{BOLD}================{RESET}\n");

    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| spamguard_config::discover_and_load().1);
    let (config, section) = check_config(path.as_deref(), |name| std::env::var(name).ok());

    let sections = vec![
        section,
        check_moderation(&config),
        check_database(&config).await,
    ];

    let (errors, warnings) = print_report(&sections);

    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

// ── Config ──────────────────────────────────────────────────────────────────

fn check_config(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> (SpamguardConfig, Section) {
    let label = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".into());
    let mut section = Section::new(format!("Config ({label})"));

    let mut config = match path {
        None => {
            section.push(Status::Info, "no config file found; using defaults and environment");
            SpamguardConfig::default()
        },
        Some(p) => match spamguard_config::load_config(p) {
            Ok(config) => {
                section.push(Status::Ok, "config file parsed");
                config
            },
            Err(e) => {
                section.push(Status::Fail, format!("cannot load config: {e}"));
                return (SpamguardConfig::default(), section);
            },
        },
    };

    if let Err(e) = spamguard_config::apply_env_overrides(&mut config, lookup) {
        section.push(Status::Fail, format!("environment: {e}"));
    }

    let result = spamguard_config::validate(&config, path.map(PathBuf::from));
    push_diagnostics(&mut section, &result);

    (config, section)
}

fn push_diagnostics(section: &mut Section, result: &ValidationResult) {
    if result.diagnostics.is_empty() {
        section.push(Status::Ok, "all settings valid");
        return;
    }
    for d in &result.diagnostics {
        let status = match d.severity {
            Severity::Error => Status::Fail,
            Severity::Warning => Status::Warn,
        };
        section.push(status, format!("{}: {}", d.path, d.message));
    }
}

// ── Moderation ──────────────────────────────────────────────────────────────

fn check_moderation(config: &SpamguardConfig) -> Section {
    let mut section = Section::new("Moderation");
    let m = &config.moderation;
    section.push(
        Status::Info,
        format!(
            "probation {} h, training mode {}, graceful mode {}",
            m.probation_hours,
            on_off(m.training_mode),
            on_off(m.graceful_mode)
        ),
    );
    let chats: Vec<String> = config
        .telegram
        .allowed_chats
        .iter()
        .map(ToString::to_string)
        .collect();
    if !chats.is_empty() {
        section.push(Status::Info, format!("moderated chats: {}", chats.join(", ")));
    }
    section.push(
        Status::Info,
        format!("classifier: {}", config.classifier.base_url),
    );
    section
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

// ── Database ────────────────────────────────────────────────────────────────

async fn check_database(config: &SpamguardConfig) -> Section {
    let url = spamguard_config::database_url(config);
    let mut section = Section::new(format!("Database ({url})"));

    let options = match SqliteConnectOptions::from_str(&url) {
        Ok(options) => options.create_if_missing(false).read_only(true),
        Err(e) => {
            section.push(Status::Fail, format!("invalid database url: {e}"));
            return section;
        },
    };

    let pool = match SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            section.push(
                Status::Warn,
                format!("cannot open database ({e}); it is created on first run"),
            );
            return section;
        },
    };

    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_joins")
        .fetch_one(&pool)
        .await
    {
        Ok(count) => section.push(Status::Ok, format!("{count} membership record(s)")),
        Err(_) => section.push(
            Status::Warn,
            "membership table missing; run `spamguard db migrate`",
        ),
    }
    pool.close().await;

    section
}
