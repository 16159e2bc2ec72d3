use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    spamguard_common::ChatId,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::SpamguardConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "spamguard.toml",
    "spamguard.yaml",
    "spamguard.yml",
    "spamguard.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<SpamguardConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./spamguard.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/spamguard/spamguard.{toml,yaml,yml,json}` (user-global)
///
/// Returns `SpamguardConfig::default()` if no config file is found or the
/// file fails to parse; the path of a file that was found is returned
/// either way so `doctor` can report it.
pub fn discover_and_load() -> (SpamguardConfig, Option<PathBuf>) {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return (SpamguardConfig::default(), None);
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => (cfg, Some(path)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            (SpamguardConfig::default(), Some(path))
        },
    }
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/spamguard/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "spamguard").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the default SQLite database.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "spamguard").map(|d| d.data_dir().to_path_buf())
}

/// Resolve the database URL, defaulting to `<data_dir>/spamguard.db`.
///
/// `mode=rwc` lets SQLite create the file on first start.
#[must_use]
pub fn database_url(config: &SpamguardConfig) -> String {
    if let Some(url) = &config.database.url {
        return url.clone();
    }
    let dir = data_dir().unwrap_or_else(|| PathBuf::from("."));
    format!("sqlite://{}?mode=rwc", dir.join("spamguard.db").display())
}

/// Apply deployment environment variables on top of the file config.
///
/// `ALLOWED_CHATS` is a `;`-separated list of chat ids and replaces the
/// file's list when set.
pub fn apply_env_overrides(
    config: &mut SpamguardConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(token) = lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.is_empty()) {
        config.telegram.token = Secret::new(token);
    }

    if let Some(raw) = lookup("ADMIN_CHAT_ID").filter(|v| !v.is_empty()) {
        let id = raw
            .parse::<ChatId>()
            .with_context(|| format!("ADMIN_CHAT_ID is not a valid chat id: {raw:?}"))?;
        config.telegram.admin_chat_id = Some(id);
    }

    if let Some(raw) = lookup("ALLOWED_CHATS").filter(|v| !v.is_empty()) {
        config.telegram.allowed_chats = raw
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<ChatId>()
                    .with_context(|| format!("ALLOWED_CHATS entry is not a chat id: {s:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
    }

    if let Some(url) = lookup("CLASSIFIER_URL").filter(|v| !v.is_empty()) {
        config.classifier.base_url = url;
    }

    if let Some(raw) = lookup("PROBATION_HOURS").filter(|v| !v.is_empty()) {
        config.moderation.probation_hours = raw
            .trim()
            .parse()
            .with_context(|| format!("PROBATION_HOURS is not a whole number: {raw:?}"))?;
    }

    if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
        config.database.url = Some(url);
    }

    Ok(())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<SpamguardConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::message(format!("unsupported config format: .{ext}")).into()),
    }
}
