use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use duecycle_core::{
    Priority, Repeat, Settings, Task, advance_all, bump_days, bump_months, bump_weeks, hazard,
    mark_done, parse_due_entry, stats,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod journal;
mod reminders_cmd;
mod state;
mod store;
mod views;
mod watch;

use journal::JournalCommand;
use reminders_cmd::RemindersCommand;
use store::Db;
use views::Scope;

#[derive(Parser, Debug)]
#[command(name = "duecycle", version, about = "Recurring tasks that catch up with you")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task
    Add {
        title: String,

        /// Due: 2024-05-01 [18:30], 05/01, 18:30, fri, evening, +2d +3h, midnight
        #[arg(long, short = 'd')]
        due: Option<String>,

        /// X, D, L, M or H (D also makes the task repeat daily)
        #[arg(long, short = 'p', default_value = "M")]
        priority: String,

        /// none, daily, weekdays, weekly, bi-weekly, monthly or custom:<days>
        #[arg(long, short = 'r', default_value = "none")]
        repeat: String,

        #[arg(long, short = 'n', default_value = "")]
        notes: String,

        #[arg(long, short = 'g', default_value = "")]
        group: String,
    },

    /// List tasks
    List {
        #[arg(long, short = 's', value_enum, default_value_t = Scope::Open)]
        scope: Scope,

        /// Only this group
        #[arg(long, short = 'g')]
        group: Option<String>,

        /// Case-insensitive match on title or notes
        #[arg(long, short = 'q')]
        search: Option<String>,
    },

    /// Complete the current cycle (repeating tasks roll to their next date)
    Done { ids: Vec<u64> },

    /// Set or clear (with "") a task's due value
    Due { id: u64, text: String },

    /// Push due values out (or back, with negative amounts). Defaults to one day.
    Bump {
        ids: Vec<u64>,

        #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["weeks", "month"])]
        days: Option<i64>,

        #[arg(long, allow_hyphen_values = true, conflicts_with = "month")]
        weeks: Option<i64>,

        /// One calendar month
        #[arg(long, default_value_t = false)]
        month: bool,
    },

    /// Change the repeat rule
    Repeat { id: u64, rule: String },

    /// Change the priority (U is reserved for escalation)
    Priority { id: u64, code: String },

    /// Move tasks to the trash
    Delete { ids: Vec<u64> },

    /// Bring tasks back from the trash
    Restore { ids: Vec<u64> },

    /// Permanently remove tasks
    Purge {
        ids: Vec<u64>,

        /// Required: purging cannot be undone
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Hide tasks from the normal views
    Suspend { ids: Vec<u64> },

    Unsuspend { ids: Vec<u64> },

    /// Advance repeating tasks through missed occurrences
    CatchUp,

    /// Stay running and catch up at every local midnight
    Watch,

    /// Reminder checkpoints
    Reminders {
        #[command(subcommand)]
        command: RemindersCommand,
    },

    /// Hazard escalation
    Hazard {
        #[command(subcommand)]
        command: HazardCommand,
    },

    /// Completion counts and streaks
    Stats,

    /// Import tasks from a text file, one per line:
    /// `title | due: fri | prio: H | repeat: weekly | notes: ... | group: ...`
    Import { file: PathBuf },

    /// Daily journal (completed tasks are logged automatically)
    Journal {
        #[command(subcommand)]
        command: JournalCommand,
    },

    /// Settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum HazardCommand {
    /// Clear skip counters and restore escalated priorities on every task
    Reset,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective settings
    Show,
    /// Set one key, e.g. `reminders.enabled true`
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("duecycle=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = state::config_path()?;
    if let Command::Config { command } = cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(&config_path),
            ConfigCommand::Show => config::show_config(&config_path),
            ConfigCommand::Set { key, value } => config::set_config(&config_path, &key, &value),
        };
    }

    let journal_dir = state::journals_dir()?;
    if let Command::Journal { command } = cli.command {
        return journal::run(command, &journal_dir, Local::now().naive_local());
    }

    let settings = config::load_settings(&config_path)?;
    let tasks_path = state::tasks_path()?;

    if let Command::Watch = cli.command {
        return watch::run(&tasks_path, &settings).await;
    }

    let now = Local::now().naive_local();
    let mut db = store::load(&tasks_path)?;

    // Same pass the app runs on launch, so every command sees caught-up tasks.
    let caught_up = advance_all(db.tasks.iter_mut(), now.date(), &settings);
    if caught_up > 0 {
        info!(changed = caught_up, "catch-up");
    }

    let changed = run(cli.command, &mut db, now, &settings, &journal_dir)?;
    if changed || caught_up > 0 {
        store::save(&tasks_path, &db)?;
        debug!(path = %tasks_path.display(), "saved");
    }
    Ok(())
}

/// Execute one database command. Returns whether anything needs saving.
fn run(
    command: Command,
    db: &mut Db,
    now: NaiveDateTime,
    settings: &Settings,
    journal_dir: &Path,
) -> Result<bool> {
    match command {
        Command::Add {
            title,
            due,
            priority,
            repeat,
            notes,
            group,
        } => {
            let title = title.trim().to_string();
            if title.is_empty() {
                bail!("title must not be empty");
            }
            let due = match due {
                Some(text) => parse_due_entry(&text, now)?,
                None => None,
            };
            let priority = Priority::parse_user(&priority)?;
            let repeat = effective_repeat(priority, repeat.parse()?);

            let id = db.insert_with(|id| {
                let mut t = Task::new(id, title, now)
                    .with_priority(priority)
                    .with_repeat(repeat);
                t.due = due;
                t.notes = notes.trim().to_string();
                t.group = group.trim().to_string();
                t
            })?;
            println!("Added task {id}.");
            Ok(true)
        }

        Command::List {
            scope,
            group,
            search,
        } => {
            let needle = search.map(|s| s.to_lowercase());
            let mut rows: Vec<&Task> = db
                .tasks
                .iter()
                .filter(|t| views::matches(t, scope, now))
                .filter(|t| group.as_deref().is_none_or(|g| t.group.eq_ignore_ascii_case(g)))
                .filter(|t| {
                    needle.as_deref().is_none_or(|q| {
                        t.title.to_lowercase().contains(q) || t.notes.to_lowercase().contains(q)
                    })
                })
                .collect();
            views::sort(&mut rows);
            if rows.is_empty() {
                println!("No tasks.");
            }
            for t in rows {
                println!("{}", views::render_row(t, now, settings));
            }
            Ok(false)
        }

        Command::Done { ids } => {
            for id in require_ids(ids)? {
                let t = db.get_mut(id)?;
                mark_done(t, now);
                t.updated_at = Some(now);
                // The task change is still saved when the journal cannot be written.
                if let Err(err) = journal::append_completed(journal_dir, &t.title, now) {
                    warn!(task_id = id, error = %format!("{err:#}"), "journal append failed");
                }
                match t.due.filter(|_| t.repeat.is_repeating()) {
                    Some(next) => println!("Done {id}; next due {next}."),
                    None => println!("Done {id}."),
                }
            }
            Ok(true)
        }

        Command::Due { id, text } => {
            let due = parse_due_entry(&text, now)?;
            let t = db.get_mut(id)?;
            t.due = due;
            t.updated_at = Some(now);
            match due {
                Some(d) => println!("Task {id} due {d}."),
                None => println!("Task {id} has no due date."),
            }
            Ok(true)
        }

        Command::Bump {
            ids,
            days,
            weeks,
            month,
        } => {
            for id in require_ids(ids)? {
                let t = db.get_mut(id)?;
                match (days, weeks, month) {
                    (_, _, true) => bump_months(t, now, settings),
                    (_, Some(w), false) => bump_weeks(t, w, now, settings),
                    (d, None, false) => bump_days(t, d.unwrap_or(1), now, settings),
                }
                t.updated_at = Some(now);
                if let Some(d) = t.due {
                    println!("Task {id} now due {d}.");
                }
            }
            Ok(true)
        }

        Command::Repeat { id, rule } => {
            let rule: Repeat = rule.parse()?;
            let t = db.get_mut(id)?;
            t.repeat = rule;
            if !rule.is_repeating() {
                // Escalation only applies to repeating tasks.
                hazard::on_complete(t);
            }
            t.updated_at = Some(now);
            println!("Task {id} repeats {rule}.");
            Ok(true)
        }

        Command::Priority { id, code } => {
            let priority = Priority::parse_user(&code)?;
            let t = db.get_mut(id)?;
            t.priority = priority;
            t.base_priority = None;
            t.repeat = effective_repeat(priority, t.repeat);
            t.updated_at = Some(now);
            println!("Task {id} priority {priority}.");
            Ok(true)
        }

        Command::Delete { ids } => {
            for id in require_ids(ids)? {
                db.soft_delete(id, now)?;
            }
            Ok(true)
        }

        Command::Restore { ids } => {
            for id in require_ids(ids)? {
                db.restore(id)?;
            }
            Ok(true)
        }

        Command::Purge { ids, yes } => {
            let ids = require_ids(ids)?;
            if !yes {
                bail!("purge permanently deletes {} task(s); re-run with --yes", ids.len());
            }
            for id in ids {
                let t = db.purge(id)?;
                println!("Purged {id} ({}).", t.title);
            }
            Ok(true)
        }

        Command::Suspend { ids } => set_suspended(db, ids, true),
        Command::Unsuspend { ids } => set_suspended(db, ids, false),

        Command::CatchUp => {
            // Catch-up already ran before dispatch.
            println!("Caught up.");
            Ok(false)
        }

        Command::Reminders { command } => reminders_cmd::run(command, db, now, settings),

        Command::Hazard {
            command: HazardCommand::Reset,
        } => {
            let n = hazard::reset_all(db.tasks.iter_mut());
            println!("Reset escalation on {n} task(s).");
            Ok(n > 0)
        }

        Command::Stats => {
            let s = stats::summary(db.tasks.iter().filter(|t| !t.is_deleted), now);
            println!("Open:         {}", s.open);
            println!("Done today:   {}", s.done_today);
            println!("Done 7 days:  {}", s.done_7);
            println!("Done 30 days: {}", s.done_30);
            if !s.top_streaks.is_empty() {
                println!("\nStreaks:");
                for st in &s.top_streaks {
                    println!("  {:>3}d  {}", st.days, st.title);
                }
            }
            Ok(false)
        }

        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let report = duecycle_ingest::parse_task_lines(&text, now);
            for err in &report.errors {
                eprintln!("{err}");
            }
            let (added, failed) = (report.added(), report.failed());
            for draft in report.tasks {
                db.insert_with(|id| draft.into_task(id, now))?;
            }
            println!("Imported {added} task(s) from {} ({failed} failed).", file.display());
            Ok(added > 0)
        }

        Command::Config { .. } | Command::Journal { .. } | Command::Watch => Ok(false),
    }
}

/// Priority D always implies at least a daily repeat.
fn effective_repeat(priority: Priority, repeat: Repeat) -> Repeat {
    if priority == Priority::Daily && repeat == Repeat::None {
        Repeat::Daily
    } else {
        repeat
    }
}

fn require_ids(ids: Vec<u64>) -> Result<Vec<u64>> {
    if ids.is_empty() {
        bail!("pass at least one task id");
    }
    Ok(ids)
}

fn set_suspended(db: &mut Db, ids: Vec<u64>, suspended: bool) -> Result<bool> {
    let mut changed = false;
    for id in require_ids(ids)? {
        changed |= db.set_suspended(id, suspended)?;
    }
    Ok(changed)
}
