use std::sync::LazyLock;

use chrono::NaiveDateTime;
use duecycle_core::{Priority, Repeat, parse_due_entry};
use regex::Regex;

use crate::types::{ImportError, ImportReport, ImportedTask};

// title | due: fri 09:00 | prio: H | repeat: weekly | notes: ... | group: ...
static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<key>due|d|priority|prio|p|repeat|r|notes|n|group|g|title|t)\s*:\s*(?P<value>.*)$")
        .expect("valid field regex")
});

#[derive(Default)]
struct RawLine<'a> {
    title: &'a str,
    due: &'a str,
    priority: &'a str,
    repeat: &'a str,
    notes: &'a str,
    group: &'a str,
}

fn split_fields(line: &str) -> RawLine<'_> {
    let mut raw = RawLine::default();
    for part in line.split('|').map(str::trim) {
        let Some(caps) = FIELD_RE.captures(part) else {
            // First bare segment is the title.
            if raw.title.is_empty() {
                raw.title = part;
            }
            continue;
        };
        let value = caps.name("value").map_or("", |m| m.as_str().trim());
        match caps["key"].to_lowercase().as_str() {
            "due" | "d" => raw.due = value,
            "priority" | "prio" | "p" => raw.priority = value,
            "repeat" | "r" => raw.repeat = value,
            "notes" | "n" => raw.notes = value,
            "group" | "g" => raw.group = value,
            _ => raw.title = value,
        }
    }
    raw
}

fn parse_repeat(value: &str, line: usize) -> Result<Repeat, ImportError> {
    let norm = value.trim().to_lowercase();
    if norm.starts_with("custom:") {
        return norm
            .parse()
            .map_err(|_| ImportError::CustomRepeatNotPositive { line });
    }
    norm.parse().map_err(|_| ImportError::InvalidRepeat {
        line,
        value: norm,
    })
}

fn parse_line(line: &str, idx: usize, now: NaiveDateTime) -> Result<ImportedTask, ImportError> {
    let raw = split_fields(line);
    if raw.title.is_empty() {
        return Err(ImportError::MissingTitle { line: idx });
    }

    let due = if raw.due.is_empty() {
        None
    } else {
        parse_due_entry(raw.due, now).map_err(|e| ImportError::InvalidDue {
            line: idx,
            value: raw.due.to_string(),
            reason: e.to_string(),
        })?
    };

    // Unknown codes (including the reserved U) import as M.
    let priority = if raw.priority.is_empty() {
        Priority::Medium
    } else {
        Priority::parse_user(raw.priority).unwrap_or_default()
    };

    let repeat = if priority == Priority::Daily {
        Repeat::Daily
    } else {
        parse_repeat(raw.repeat, idx)?
    };

    Ok(ImportedTask {
        line: idx,
        title: raw.title.to_string(),
        notes: raw.notes.to_string(),
        group: raw.group.to_string(),
        priority,
        due,
        repeat,
    })
}

/// Parse a multi-line task list.
///
/// Blank lines and `#` comments are skipped and a leading `- ` bullet is
/// stripped. Bad lines are reported with their 1-based number and do not stop
/// the rest of the import. `now` anchors relative and time-only due values.
pub fn parse_task_lines(text: &str, now: NaiveDateTime) -> ImportReport {
    let mut report = ImportReport::default();

    for (i, raw) in text.lines().enumerate() {
        let idx = i + 1;
        let mut line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("- ") {
            line = rest.trim();
        }

        match parse_line(line, idx, now) {
            Ok(task) => report.tasks.push(task),
            Err(e) => report.errors.push(e),
        }
    }

    report
}
