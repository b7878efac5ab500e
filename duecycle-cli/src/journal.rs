//! Daily markdown journal: `journals/YYYY/MM/YYYY-MM-DD.md`.
//!
//! Each file has a free-form top section for manual entries and a bottom
//! section, after the divider, holding the completed-task log.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};

const DIVIDER: &str = "\n---\n";
const COMPLETED_HEADER: &str = "## Completed Tasks";

#[derive(Subcommand, Debug)]
pub enum JournalCommand {
    /// Append a timestamped line to today's journal
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Print the journal file for a day (creating it if needed)
    Path {
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(cmd: JournalCommand, root: &Path, now: NaiveDateTime) -> Result<()> {
    match cmd {
        JournalCommand::Add { text } => {
            let path = append_entry(root, &text.join(" "), now)?;
            println!("{}", path.display());
        }
        JournalCommand::Path { date } => {
            let path = ensure_journal(root, date.unwrap_or(now.date()))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

pub fn journal_path(root: &Path, day: NaiveDate) -> PathBuf {
    root.join(day.format("%Y").to_string())
        .join(day.format("%m").to_string())
        .join(format!("{}.md", day.format("%Y-%m-%d")))
}

pub fn ensure_journal(root: &Path, day: NaiveDate) -> Result<PathBuf> {
    let path = journal_path(root, day);
    if !path.exists() {
        write_sections(&path, "", "")?;
    }
    Ok(path)
}

/// Manual entry: `- HH:MM <text>` at the end of the top section.
pub fn append_entry(root: &Path, text: &str, at: NaiveDateTime) -> Result<PathBuf> {
    let path = ensure_journal(root, at.date())?;
    let (top, bottom) = read_sections(&path)?;
    let text = text.trim();
    let top = if text.is_empty() {
        top
    } else {
        join_line(&top, &format!("- {} {text}", at.format("%H:%M")))
    };
    write_sections(&path, &top, &bottom)?;
    Ok(path)
}

/// Completion log: `- HH:MM Completed: <title>` under the completed header.
pub fn append_completed(root: &Path, title: &str, at: NaiveDateTime) -> Result<PathBuf> {
    let path = ensure_journal(root, at.date())?;
    let (top, bottom) = read_sections(&path)?;
    let title = match title.trim() {
        "" => "Task completed",
        t => t,
    };

    let bottom = if bottom.is_empty() {
        COMPLETED_HEADER.to_string()
    } else if !bottom.starts_with(COMPLETED_HEADER) {
        format!("{COMPLETED_HEADER}\n{bottom}")
    } else {
        bottom
    };
    let bottom = join_line(&bottom, &format!("- {} Completed: {title}", at.format("%H:%M")));

    write_sections(&path, &top, &bottom)?;
    Ok(path)
}

fn join_line(section: &str, line: &str) -> String {
    format!("{section}\n{line}").trim().to_string()
}

fn read_sections(path: &Path) -> Result<(String, String)> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(match content.split_once(DIVIDER) {
        Some((top, bottom)) => (top.trim().to_string(), bottom.trim().to_string()),
        None => (content.trim().to_string(), String::new()),
    })
}

fn write_sections(path: &Path, top: &str, bottom: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let body = format!("{}{DIVIDER}{}\n", top.trim(), bottom.trim());
    fs::write(path, body).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    #[test]
    fn path_is_nested_by_year_and_month() {
        let root = Path::new("/j");
        let p = journal_path(root, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
        assert_eq!(p, Path::new("/j/2024/03/2024-03-08.md"));
    }

    #[test]
    fn new_journal_is_just_the_divider() {
        let dir = tempfile::tempdir().unwrap();
        let p = ensure_journal(dir.path(), at(0, 0).date()).unwrap();
        assert_eq!(fs::read_to_string(p).unwrap(), "\n---\n\n");
    }

    #[test]
    fn entries_and_completions_land_in_their_sections() {
        let dir = tempfile::tempdir().unwrap();
        append_completed(dir.path(), "water plants", at(8, 5)).unwrap();
        append_entry(dir.path(), "slept badly", at(9, 0)).unwrap();
        append_entry(dir.path(), "   ", at(9, 1)).unwrap();
        let p = append_completed(dir.path(), "  ", at(21, 30)).unwrap();

        assert_eq!(
            fs::read_to_string(p).unwrap(),
            "- 09:00 slept badly\n---\n## Completed Tasks\n- 08:05 Completed: water plants\n- 21:30 Completed: Task completed\n"
        );
    }

    #[test]
    fn header_is_added_above_existing_bottom_text() {
        let dir = tempfile::tempdir().unwrap();
        let p = journal_path(dir.path(), at(0, 0).date());
        write_sections(&p, "morning pages", "loose note").unwrap();
        append_completed(dir.path(), "gym", at(18, 0)).unwrap();
        assert_eq!(
            fs::read_to_string(p).unwrap(),
            "morning pages\n---\n## Completed Tasks\nloose note\n- 18:00 Completed: gym\n"
        );
    }
}
