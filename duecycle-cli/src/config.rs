use anyhow::{Context, Result, bail};
use duecycle_core::{Priority, Settings};
use std::fs;
use std::path::Path;

pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let s = toml::to_string_pretty(settings).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    save_settings(path, &Settings::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn show_config(path: &Path) -> Result<()> {
    let settings = load_settings(path)?;
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&settings).context("serialize config")?);
    Ok(())
}

/// Apply `key = value` where key is `section.field`.
pub fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "reminders.enabled" => settings.reminders.enabled = parse_bool(value)?,
        "reminders.count" => {
            let n: u32 = value
                .trim()
                .parse()
                .with_context(|| format!("reminders.count must be a whole number, got '{value}'"))?;
            if n == 0 {
                bail!("reminders.count must be at least 1");
            }
            settings.reminders.count = n;
        }
        "reminders.min_priority" => settings.reminders.min_priority = Priority::parse_user(value)?,
        "hazard.escalation_enabled" => settings.hazard.escalation_enabled = parse_bool(value)?,
        other => bail!(
            "unknown config key '{other}' (expected reminders.enabled, reminders.count, \
             reminders.min_priority or hazard.escalation_enabled)"
        ),
    }
    Ok(())
}

pub fn set_config(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut settings = load_settings(path)?;
    set_value(&mut settings, key, value)?;
    save_settings(path, &settings)?;
    println!("{key} = {value}");
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("expected true/false, got '{value}'"),
    }
}
