use anyhow::{Result, bail};
use chrono::NaiveDateTime;
use clap::Subcommand;
use duecycle_core::time::{CHECKPOINT_KEY_FMT, checkpoint_key};
use duecycle_core::{Settings, Task, acknowledge, checkpoints, pending_key, pending_reminders};

use crate::store::Db;

#[derive(Subcommand, Debug)]
pub enum RemindersCommand {
    /// Tasks with a reminder checkpoint waiting to be acknowledged
    List {
        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Acknowledge the pending checkpoint of one task, or of every task
    Ack {
        /// Task id (omit with --all)
        id: Option<u64>,

        /// Acknowledge this exact checkpoint key instead of the current one
        #[arg(long)]
        key: Option<String>,

        #[arg(long, default_value_t = false)]
        all: bool,
    },
}

/// Runs the subcommand; returns whether the database changed.
pub fn run(cmd: RemindersCommand, db: &mut Db, now: NaiveDateTime, settings: &Settings) -> Result<bool> {
    match cmd {
        RemindersCommand::List { json } => {
            list(db, now, settings, json)?;
            Ok(false)
        }
        RemindersCommand::Ack { id, key, all } => ack(db, now, settings, id, key, all),
    }
}

fn list(db: &Db, now: NaiveDateTime, settings: &Settings, json: bool) -> Result<()> {
    if !settings.reminders.enabled {
        println!("Reminders are disabled. Enable with: duecycle config set reminders.enabled true");
        return Ok(());
    }
    let rows = pending_reminders(&db.tasks, now, settings);
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No pending reminders.");
        return Ok(());
    }
    for r in &rows {
        println!(
            "{:>4}  [{}]  due {:<16}  checkpoint {}  {}",
            r.task_id, r.priority, r.due, r.checkpoint_key, r.title
        );
    }
    Ok(())
}

fn ack(
    db: &mut Db,
    now: NaiveDateTime,
    settings: &Settings,
    id: Option<u64>,
    key: Option<String>,
    all: bool,
) -> Result<bool> {
    if all {
        let pending = pending_reminders(&db.tasks, now, settings);
        for r in &pending {
            acknowledge(db.get_mut(r.task_id)?, &r.checkpoint_key);
        }
        println!("Acknowledged {} reminder(s).", pending.len());
        return Ok(!pending.is_empty());
    }

    let Some(id) = id else {
        bail!("pass a task id or --all");
    };
    let task = db.get_mut(id)?;
    let key = match key {
        Some(k) => Some(resolve_key(task, &k, now, settings)?),
        None => pending_key(now, task, settings),
    };
    let key = match key {
        Some(k) => k,
        None => {
            println!("Task {id} has no pending reminder.");
            return Ok(false);
        }
    };
    let added = acknowledge(task, &key);
    if added {
        println!("Acknowledged {key} for task {id}.");
    } else {
        println!("{key} was already acknowledged for task {id}.");
    }
    Ok(added)
}

/// Canonical form of a user-typed key, which must name one of the task's checkpoints.
fn resolve_key(task: &Task, raw: &str, now: NaiveDateTime, settings: &Settings) -> Result<String> {
    let Ok(at) = NaiveDateTime::parse_from_str(raw.trim(), CHECKPOINT_KEY_FMT) else {
        bail!("'{raw}' is not a checkpoint key (expected YYYY-MM-DDTHH:MM)");
    };
    if !checkpoints(task, now, settings.checkpoint_count()).contains(&at) {
        bail!("{} is not a reminder checkpoint of task {}", checkpoint_key(at), task.id);
    }
    Ok(checkpoint_key(at))
}
