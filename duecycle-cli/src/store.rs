//! `tasks.json`: the single-writer task database.

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use duecycle_core::Task;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DB_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Db {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_next_id")]
    pub next_id: u64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

fn default_version() -> u32 {
    DB_VERSION
}

fn default_next_id() -> u64 {
    1
}

impl Default for Db {
    fn default() -> Self {
        Self {
            version: DB_VERSION,
            next_id: 1,
            tasks: Vec::new(),
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("json.bak")
}

fn read_db(path: &Path) -> Result<Db> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut db: Db = serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    // Never hand out an id that is already taken.
    let max_id = db.tasks.iter().map(|t| t.id).max().unwrap_or(0);
    db.next_id = db.next_id.max(max_id.saturating_add(1));
    Ok(db)
}

/// Load the database, falling back to the backup when the primary is corrupt.
///
/// A missing file is an empty database.
pub fn load(path: &Path) -> Result<Db> {
    if !path.exists() {
        return Ok(Db::default());
    }
    match read_db(path) {
        Ok(db) => Ok(db),
        Err(err) => {
            let bak = backup_path(path);
            if !bak.exists() {
                return Err(err);
            }
            warn!(error = %format!("{err:#}"), backup = %bak.display(), "task file unreadable, using backup");
            read_db(&bak).with_context(|| format!("{err:#}; backup also unreadable"))
        }
    }
}

/// Write to a temp sibling, fsync, then rename over the target.
///
/// The previous file is copied to `tasks.json.bak` first.
pub fn save(path: &Path, db: &Db) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    if path.exists() {
        let bak = backup_path(path);
        // A corrupt primary must not replace the last good backup.
        match read_db(path) {
            Ok(_) => {
                fs::copy(path, &bak).with_context(|| format!("backup to {}", bak.display()))?;
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), backup = %bak.display(), "task file unreadable, keeping existing backup");
            }
        }
    }

    let json = serde_json::to_string_pretty(db).context("serialize tasks")?;
    let tmp = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("write {}", tmp.display()))?;
    file.sync_all()
        .with_context(|| format!("sync {}", tmp.display()))?;
    drop(file);

    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

impl Db {
    /// Store a new task built with the next free id and return that id.
    pub fn insert_with(&mut self, build: impl FnOnce(u64) -> Task) -> Result<u64> {
        let id = self.next_id;
        let Some(next) = id.checked_add(1) else {
            bail!("task ids exhausted (next id {id})");
        };
        self.next_id = next;
        self.tasks.push(build(id));
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Result<&mut Task> {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(t) => Ok(t),
            None => bail!("no task with id {id}"),
        }
    }

    pub fn soft_delete(&mut self, id: u64, now: NaiveDateTime) -> Result<()> {
        let t = self.get_mut(id)?;
        t.is_deleted = true;
        t.deleted_at = Some(now);
        Ok(())
    }

    pub fn restore(&mut self, id: u64) -> Result<()> {
        let t = self.get_mut(id)?;
        t.is_deleted = false;
        t.deleted_at = None;
        Ok(())
    }

    /// Returns `false` when the flag already had that value.
    pub fn set_suspended(&mut self, id: u64, suspended: bool) -> Result<bool> {
        let t = self.get_mut(id)?;
        let changed = t.is_suspended != suspended;
        t.is_suspended = suspended;
        Ok(changed)
    }

    /// Permanently remove a task.
    pub fn purge(&mut self, id: u64) -> Result<Task> {
        let Some(pos) = self.tasks.iter().position(|t| t.id == id) else {
            bail!("no task with id {id}");
        };
        info!(task_id = id, "hard delete");
        Ok(self.tasks.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use duecycle_core::{DueValue, Repeat};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn missing_file_is_empty_db() {
        let dir = tempfile::tempdir().unwrap();
        let db = load(&dir.path().join("tasks.json")).unwrap();
        assert_eq!(db, Db::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tasks.json");
        let mut db = Db::default();
        let id = db.insert_with(|id| {
            Task::new(id, "laundry", now())
                .with_repeat(Repeat::Weekly)
                .with_due(DueValue::DateOnly(now().date()))
        })
        .unwrap();
        save(&p, &db).unwrap();

        let back = load(&p).unwrap();
        assert_eq!(back, db);
        assert_eq!(back.get(id).map(|t| t.title.as_str()), Some("laundry"));
        assert!(!p.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_primary_falls_back_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tasks.json");
        let mut db = Db::default();
        db.insert_with(|id| Task::new(id, "first", now())).unwrap();
        save(&p, &db).unwrap();
        db.insert_with(|id| Task::new(id, "second", now())).unwrap();
        save(&p, &db).unwrap();

        fs::write(&p, "{ not json").unwrap();
        let back = load(&p).unwrap();
        assert_eq!(back.tasks.len(), 1);
        assert_eq!(back.tasks[0].title, "first");
    }

    #[test]
    fn saving_after_recovery_keeps_good_backup() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tasks.json");
        let bak = p.with_extension("json.bak");
        let mut db = Db::default();
        db.insert_with(|id| Task::new(id, "first", now())).unwrap();
        save(&p, &db).unwrap();
        save(&p, &db).unwrap();

        fs::write(&p, "{ not json").unwrap();
        let mut recovered = load(&p).unwrap();
        recovered.insert_with(|id| Task::new(id, "after", now())).unwrap();
        save(&p, &recovered).unwrap();

        let kept = fs::read_to_string(&bak).unwrap();
        assert_ne!(kept, "{ not json");
        let from_bak: Db = serde_json::from_str(&kept).unwrap();
        assert_eq!(from_bak.tasks.len(), 1);
        assert_eq!(load(&p).unwrap().tasks.len(), 2);
    }

    #[test]
    fn exhausted_ids_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tasks.json");
        fs::write(
            &p,
            format!(r#"{{"next_id": 1, "tasks": [{{"id": {}, "title": "last"}}]}}"#, u64::MAX),
        )
        .unwrap();
        let mut db = load(&p).unwrap();
        assert_eq!(db.next_id, u64::MAX);
        assert!(db.insert_with(|id| Task::new(id, "one more", now())).is_err());
        assert_eq!(db.tasks.len(), 1);
    }

    #[test]
    fn next_id_never_reuses_existing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tasks.json");
        fs::write(
            &p,
            r#"{"next_id": 1, "tasks": [{"id": 5, "title": "legacy", "due": "2024-01-01"}]}"#,
        )
        .unwrap();
        let mut db = load(&p).unwrap();
        assert_eq!(db.version, DB_VERSION);
        assert_eq!(db.insert_with(|id| Task::new(id, "new", now())).unwrap(), 6);
    }

    #[test]
    fn delete_restore_suspend_purge() {
        let mut db = Db::default();
        let id = db.insert_with(|id| Task::new(id, "x", now())).unwrap();

        db.soft_delete(id, now()).unwrap();
        assert!(db.get(id).unwrap().is_deleted);
        assert_eq!(db.get(id).unwrap().deleted_at, Some(now()));
        db.restore(id).unwrap();
        assert!(!db.get(id).unwrap().is_deleted);
        assert_eq!(db.get(id).unwrap().deleted_at, None);

        assert!(db.set_suspended(id, true).unwrap());
        assert!(!db.set_suspended(id, true).unwrap());

        assert_eq!(db.purge(id).unwrap().id, id);
        assert!(db.get(id).is_none());
        assert!(db.purge(id).is_err());
        assert!(db.soft_delete(99, now()).is_err());
    }
}
