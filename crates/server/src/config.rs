use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use color_analysis::DEFAULT_MATCH_THRESHOLD;
use color_wheel::DEFAULT_SECTOR_COUNT;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_seconds: i64,
    pub wheel_sector_count: usize,
    pub palettes_path: String,
    pub palette_match_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/accounts.db".into(),
            session_secret: "dev-session-secret".into(),
            session_ttl_seconds: 7 * 24 * 3600,
            wheel_sector_count: DEFAULT_SECTOR_COUNT,
            palettes_path: "palettes.json".into(),
            palette_match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_file_settings(&mut settings, &file_cfg);
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = file_cfg.get("session_secret") {
        settings.session_secret = v.clone();
    }
    if let Some(v) = file_cfg.get("palettes_path") {
        settings.palettes_path = v.clone();
    }
    if let Some(v) = file_cfg.get("session_ttl_seconds").and_then(|v| v.parse().ok()) {
        settings.session_ttl_seconds = v;
    }
    if let Some(v) = file_cfg.get("wheel_sector_count").and_then(|v| v.parse().ok()) {
        settings.wheel_sector_count = v;
    }
    if let Some(v) = file_cfg
        .get("palette_match_threshold")
        .and_then(|v| v.parse().ok())
    {
        settings.palette_match_threshold = v;
    }
}

/// Later keys win, so `APP__*` overrides the bare names.
fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("APP__SESSION_SECRET") {
        settings.session_secret = v;
    }
    if let Some(v) = lookup("APP__SESSION_TTL_SECONDS").and_then(|v| v.parse().ok()) {
        settings.session_ttl_seconds = v;
    }
    if let Some(v) = lookup("APP__WHEEL_SECTOR_COUNT").and_then(|v| v.parse().ok()) {
        settings.wheel_sector_count = v;
    }
    if let Some(v) = lookup("APP__PALETTES_PATH") {
        settings.palettes_path = v;
    }
    if let Some(v) = lookup("APP__PALETTE_MATCH_THRESHOLD").and_then(|v| v.parse().ok()) {
        settings.palette_match_threshold = v;
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
