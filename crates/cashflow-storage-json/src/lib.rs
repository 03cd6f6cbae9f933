//! JSON-file persistence for planner data.
//!
//! The whole planner lives in one pretty-printed JSON document. Every committed
//! write replaces the file atomically (temp file + rename) after copying the
//! previous version into a timestamped backup.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use cashflow_core::{
    AccountQuery, AccountStore, CategoryStore, CoreError, ExceptionStore, PlannerData,
    ReconciliationStore, RuleStore, Transactional,
};
use cashflow_domain::{
    Account, Category, CategoryKind, DateWindow, RecurrenceRule, Reconciliation, RuleException,
};

const DATA_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backup not found: {0}")]
    BackupNotFound(String),
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        CoreError::Storage(err.to_string())
    }
}

/// A backup copy of the planner file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Planner store persisted to a single JSON file.
///
/// Reads are served from memory. Each write flushes to disk, except inside
/// [`Transactional::atomically`], which flushes once when the closure succeeds.
#[derive(Debug)]
pub struct JsonPlannerStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    data: PlannerData,
    in_transaction: bool,
}

impl JsonPlannerStore {
    /// Opens the store at `path`, keeping backups in a `backups` directory beside it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let backups_dir = path
            .parent()
            .map(|parent| parent.join("backups"))
            .unwrap_or_else(|| PathBuf::from("backups"));
        Self::with_retention(path, backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(
        path: PathBuf,
        backups_dir: PathBuf,
        retention: usize,
    ) -> Result<Self, StorageError> {
        let data = if path.exists() {
            load_from_path(&path)?
        } else {
            PlannerData::default()
        };
        debug!(
            path = %path.display(),
            rules = data.rules.len(),
            accounts = data.accounts.len(),
            "opened planner store"
        );
        Ok(Self {
            path,
            backups_dir,
            retention: retention.max(1),
            data,
            in_transaction: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &PlannerData {
        &self.data
    }

    /// Applies an arbitrary edit (imports, seeding) and persists it.
    pub fn update_data<F>(&mut self, edit: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut PlannerData),
    {
        self.atomically(|store| {
            edit(&mut store.data);
            Ok(())
        })
    }

    pub fn add_account(&mut self, account: Account) -> Result<Uuid, CoreError> {
        let id = account.id;
        self.update_data(|data| {
            data.add_account(account);
        })?;
        Ok(id)
    }

    pub fn add_category(&mut self, category: Category) -> Result<Uuid, CoreError> {
        let id = category.id;
        self.update_data(|data| {
            data.add_category(category);
        })?;
        Ok(id)
    }

    /// Writes the current snapshot, backing up the previous file first.
    pub fn save(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            self.backup_existing_file()?;
        }
        save_to_path(&self.data, &self.path)
    }

    /// Writes a labelled backup of the current snapshot.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, StorageError> {
        fs::create_dir_all(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", self.file_stem(), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let path = self.backups_dir.join(format!("{stem}.{DATA_EXTENSION}"));
        write_atomic(&path, &serialize(&self.data)?)?;
        self.prune_backups()?;
        backup_info(&path).ok_or_else(|| StorageError::BackupNotFound(path.display().to_string()))
    }

    /// Backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, StorageError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", self.file_stem());
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DATA_EXTENSION) {
                continue;
            }
            let matches_prefix = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix));
            if !matches_prefix {
                continue;
            }
            if let Some(info) = backup_info(&path) {
                entries.push(info);
            }
        }
        entries.sort_by_key(|info| Reverse((info.created_at, info.id.clone())));
        Ok(entries)
    }

    /// Replaces the live snapshot with a backup and persists it.
    pub fn restore_backup(&mut self, backup_id: &str) -> Result<(), StorageError> {
        let path = self.backups_dir.join(backup_id);
        if !path.exists() {
            return Err(StorageError::BackupNotFound(backup_id.to_string()));
        }
        self.data = load_from_path(&path)?;
        self.save()
    }

    fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("planner")
            .to_string()
    }

    fn backup_existing_file(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let backup_path = self.backups_dir.join(format!(
            "{}_{}.{}",
            self.file_stem(),
            timestamp,
            DATA_EXTENSION
        ));
        fs::copy(&self.path, &backup_path)?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<(), StorageError> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(path = %entry.path.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), CoreError> {
        if self.in_transaction {
            return Ok(());
        }
        self.save().map_err(CoreError::from)
    }

    /// Runs a single write against the snapshot and persists it, rolling the
    /// snapshot back when persisting fails.
    fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut PlannerData) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        if self.in_transaction {
            return op(&mut self.data);
        }
        let checkpoint = self.data.clone();
        let value = op(&mut self.data)?;
        if let Err(err) = self.flush() {
            self.data = checkpoint;
            return Err(err);
        }
        Ok(value)
    }
}

impl RuleStore for JsonPlannerStore {
    fn rules_for_user(&self, user_id: Uuid) -> Result<Vec<RecurrenceRule>, CoreError> {
        self.data.rules_for_user(user_id)
    }

    fn rules_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecurrenceRule>, CoreError> {
        self.data.rules_by_ids(ids)
    }

    fn rule(&self, id: Uuid) -> Result<Option<RecurrenceRule>, CoreError> {
        self.data.rule(id)
    }

    fn insert_rule(&mut self, rule: RecurrenceRule) -> Result<(), CoreError> {
        self.apply(|data| data.insert_rule(rule))
    }

    fn replace_rule(&mut self, rule: RecurrenceRule) -> Result<(), CoreError> {
        self.apply(|data| data.replace_rule(rule))
    }

    fn delete_rule(&mut self, id: Uuid) -> Result<bool, CoreError> {
        self.apply(|data| data.delete_rule(id))
    }
}

impl ExceptionStore for JsonPlannerStore {
    fn exceptions_in_window(
        &self,
        rule_ids: &[Uuid],
        window: DateWindow,
    ) -> Result<Vec<RuleException>, CoreError> {
        self.data.exceptions_in_window(rule_ids, window)
    }

    fn exception(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<RuleException>, CoreError> {
        self.data.exception(rule_id, date)
    }

    fn upsert_exception(&mut self, exception: RuleException) -> Result<(), CoreError> {
        self.apply(|data| data.upsert_exception(exception))
    }

    fn delete_exceptions_for_rule(&mut self, rule_id: Uuid) -> Result<usize, CoreError> {
        self.apply(|data| data.delete_exceptions_for_rule(rule_id))
    }
}

impl AccountStore for JsonPlannerStore {
    fn active_accounts(
        &self,
        user_id: Uuid,
        query: &AccountQuery,
    ) -> Result<Vec<Account>, CoreError> {
        self.data.active_accounts(user_id, query)
    }

    fn accounts_for_user(&self, user_id: Uuid) -> Result<Vec<Account>, CoreError> {
        self.data.accounts_for_user(user_id)
    }

    fn account(&self, id: Uuid) -> Result<Option<Account>, CoreError> {
        self.data.account(id)
    }
}

impl CategoryStore for JsonPlannerStore {
    fn categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, CoreError> {
        self.data.categories_by_ids(ids)
    }

    fn upsert_system_category(
        &mut self,
        name: &str,
        kind: CategoryKind,
    ) -> Result<Category, CoreError> {
        self.apply(|data| data.upsert_system_category(name, kind))
    }
}

impl ReconciliationStore for JsonPlannerStore {
    fn reconciliations_for_user(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Reconciliation>, CoreError> {
        self.data.reconciliations_for_user(user_id, account_id)
    }

    fn reconciliation(&self, id: Uuid) -> Result<Option<Reconciliation>, CoreError> {
        self.data.reconciliation(id)
    }

    fn insert_reconciliation(&mut self, reconciliation: Reconciliation) -> Result<(), CoreError> {
        self.apply(|data| data.insert_reconciliation(reconciliation))
    }

    fn delete_reconciliation(&mut self, id: Uuid) -> Result<bool, CoreError> {
        self.apply(|data| data.delete_reconciliation(id))
    }
}

impl Transactional for JsonPlannerStore {
    fn atomically<T, F>(&mut self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, CoreError>,
    {
        let scope = TransactionScope::begin(self);
        let result = work(&mut *scope.store);
        let (checkpoint, outermost) = scope.finish();

        let value = match result {
            Ok(value) => value,
            Err(err) => {
                self.data = checkpoint;
                return Err(err);
            }
        };
        if outermost {
            if let Err(err) = self.flush() {
                self.data = checkpoint;
                return Err(err);
            }
        }
        Ok(value)
    }
}

/// Marks the store as inside a transaction until dropped.
///
/// Dropping it without [`TransactionScope::finish`] (a panic in the work closure)
/// restores the snapshot taken at `begin`.
struct TransactionScope<'a> {
    store: &'a mut JsonPlannerStore,
    outermost: bool,
    checkpoint: Option<PlannerData>,
}

impl<'a> TransactionScope<'a> {
    fn begin(store: &'a mut JsonPlannerStore) -> Self {
        let outermost = !store.in_transaction;
        store.in_transaction = true;
        let checkpoint = Some(store.data.clone());
        Self {
            store,
            outermost,
            checkpoint,
        }
    }

    /// Leaves the scope, returning the checkpoint and whether it was the outermost one.
    fn finish(mut self) -> (PlannerData, bool) {
        let checkpoint = self.checkpoint.take().unwrap_or_default();
        (checkpoint, self.outermost)
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if self.outermost {
            self.store.in_transaction = false;
        }
        if let Some(checkpoint) = self.checkpoint.take() {
            warn!(path = %self.store.path.display(), "transaction unwound, snapshot restored");
            self.store.data = checkpoint;
        }
    }
}

/// Loads a planner snapshot from an arbitrary path.
pub fn load_from_path(path: &Path) -> Result<PlannerData, StorageError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Saves a planner snapshot to an arbitrary path, atomically.
pub fn save_to_path(data: &PlannerData, path: &Path) -> Result<(), StorageError> {
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize(data)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn serialize(data: &PlannerData) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(data)?)
}

fn backup_info(path: &Path) -> Option<BackupInfo> {
    let id = path.file_name()?.to_str()?.to_string();
    let size_bytes = fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
    Some(BackupInfo {
        created_at: parse_backup_timestamp(&id),
        id,
        size_bytes,
        path: path.to_path_buf(),
    })
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Extracts the `YYYYMMDD_HHMM` stamp that follows the file stem.
fn parse_backup_timestamp(file_name: &str) -> Option<DateTime<Utc>> {
    let trimmed = file_name.strip_suffix(&format!(".{DATA_EXTENSION}"))?;
    let segments: Vec<&str> = trimmed.split('_').collect();
    segments.windows(2).find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        if !is_digits(date, 8) || !is_digits(time, 4) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M")
            .ok()
            .map(|naive| naive.and_utc())
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_timestamp_is_parsed_after_stem() {
        let parsed = parse_backup_timestamp("planner_20250131_0945_before-import.json").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-01-31T09:45:00+00:00");
        assert!(parse_backup_timestamp("planner.json").is_none());
    }

    #[test]
    fn backup_notes_are_slugged() {
        assert_eq!(
            sanitize_backup_note(Some("  Before Import!! ")).as_deref(),
            Some("before-import")
        );
        assert_eq!(sanitize_backup_note(Some("***")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("/data/planner.json")),
            PathBuf::from("/data/planner.json.tmp")
        );
    }
}
