use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$DUECYCLE_HOME`, or `~/.duecycle`.
pub fn duecycle_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("DUECYCLE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set (or set DUECYCLE_HOME)")?;
    Ok(PathBuf::from(home).join(".duecycle"))
}

pub fn ensure_duecycle_home() -> Result<PathBuf> {
    let dir = duecycle_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_duecycle_home()?.join("config.toml"))
}

pub fn tasks_path() -> Result<PathBuf> {
    Ok(ensure_duecycle_home()?.join("tasks.json"))
}

pub fn journals_dir() -> Result<PathBuf> {
    Ok(ensure_duecycle_home()?.join("journals"))
}
