use std::{
    cmp::Reverse,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use tally_core::{
    storage::{book_warnings, BookBackupInfo, BookStorage},
    CoreError,
};
use tally_domain::Book;

const FILE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_RETENTION: usize = 5;

/// Directories used by [`JsonBookStorage`].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub book_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// `<base>/data` for books and `<base>/backups` for their backups.
    pub fn under(base: &Path) -> Self {
        Self {
            book_root: base.join("data"),
            backup_root: base.join("backups"),
        }
    }
}

/// Filesystem-backed JSON persistence for books and their backups.
#[derive(Clone)]
pub struct JsonBookStorage {
    books_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonBookStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.book_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            books_dir: paths.book_root,
            backups_dir: paths.backup_root,
            retention: retention.max(1),
        })
    }

    pub fn book_path(&self, name: &str) -> PathBuf {
        self.books_dir
            .join(format!("{}.{}", canonical_name(name), FILE_EXTENSION))
    }

    pub fn backup_path(&self, name: &str, backup: &str) -> PathBuf {
        self.backup_dir(name).join(backup)
    }

    /// Finds a backup by file name (or unique file-name prefix).
    pub fn find_backup(&self, name: &str, reference: &str) -> Result<BookBackupInfo, CoreError> {
        let wanted = reference.trim();
        let backups = self.list_backups(name)?;
        if let Some(exact) = backups.iter().find(|info| info.id == wanted) {
            return Ok(exact.clone());
        }
        let mut matches = backups.into_iter().filter(|info| info.id.starts_with(wanted));
        match (matches.next(), matches.next()) {
            (Some(found), None) => Ok(found),
            (Some(_), Some(_)) => Err(CoreError::Storage(format!(
                "backup reference `{}` is ambiguous",
                wanted
            ))),
            (None, _) => Err(CoreError::Storage(format!("backup `{}` not found", wanted))),
        }
    }

    pub fn list_backup_metadata(&self, name: &str) -> Result<Vec<BackupMetadata>, CoreError> {
        let mut rows = Vec::new();
        for entry in self.list_backups(name)? {
            let size_bytes = fs::metadata(&entry.path)
                .map(|meta| meta.len())
                .unwrap_or(0);
            rows.push(BackupMetadata {
                name: entry.id.clone(),
                created_at: parse_backup_timestamp(&entry.id),
                size_bytes,
                path: entry.path,
            });
        }
        rows.sort_by_key(|meta| Reverse(meta.created_at));
        Ok(rows)
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    fn write_backup_file(
        &self,
        book: &Book,
        name: &str,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError> {
        let (path, timestamp) = self.next_backup_path(name, note)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        write_replacing(&path, &serialize_book(book)?)?;
        tracing::info!(backup = %file_name, "wrote book backup");
        self.prune_backups(name)?;
        Ok(BookBackupInfo {
            book: canonical_name(name),
            id: file_name,
            created_at: timestamp,
            path,
        })
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<(), CoreError> {
        if !path.exists() {
            return Ok(());
        }
        let (backup_path, _) = self.next_backup_path(name, None)?;
        fs::copy(path, &backup_path)?;
        tracing::debug!(path = %backup_path.display(), "copied previous book before save");
        self.prune_backups(name)?;
        Ok(())
    }

    /// A free `<book>_<stamp>[_<note>].json` path plus the stamp it carries.
    fn next_backup_path(
        &self,
        name: &str,
        note: Option<&str>,
    ) -> Result<(PathBuf, String), CoreError> {
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let stem = match note.and_then(note_label) {
            Some(label) => format!("{}_{}_{}", canonical_name(name), timestamp, label),
            None => format!("{}_{}", canonical_name(name), timestamp),
        };
        Ok((unique_path(&dir, &stem), timestamp))
    }

    fn prune_backups(&self, name: &str) -> Result<(), CoreError> {
        let entries = self.list_backups(name)?;
        for entry in entries.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                tracing::warn!(backup = %entry.id, error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl BookStorage for JsonBookStorage {
    fn save_book(&self, name: &str, book: &Book) -> Result<(), CoreError> {
        let path = self.book_path(name);
        if path.exists() {
            self.backup_existing_file(name, &path)?;
        }
        save_book_to_path(book, &path)?;
        tracing::info!(path = %path.display(), "saved book");
        Ok(())
    }

    fn load_book(&self, name: &str) -> Result<Book, CoreError> {
        let path = self.book_path(name);
        let book = load_book_from_path(&path)?;
        for warning in book_warnings(&book) {
            tracing::warn!(book = name, "{}", warning);
        }
        tracing::debug!(path = %path.display(), expenses = book.expenses.len(), "loaded book");
        Ok(book)
    }

    fn load_or_default(&self, name: &str) -> Result<Book, CoreError> {
        if self.book_path(name).exists() {
            self.load_book(name)
        } else {
            tracing::debug!(book = name, "no stored book, starting empty");
            Ok(Book::new(name))
        }
    }

    fn list_books(&self) -> Result<Vec<String>, CoreError> {
        if !self.books_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.books_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn save_book_to_path(&self, book: &Book, path: &Path) -> Result<(), CoreError> {
        if path.starts_with(&self.books_dir) {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                self.backup_existing_file(stem, path)?;
            }
        }
        save_book_to_path(book, path)
    }

    fn load_book_from_path(&self, path: &Path) -> Result<Book, CoreError> {
        load_book_from_path(path)
    }

    fn backup_book(
        &self,
        name: &str,
        book: &Book,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError> {
        self.write_backup_file(book, name, note)
    }

    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        let slug = canonical_name(name);
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                let created_at = parse_backup_timestamp(file_name)
                    .map(|stamp| stamp.format(BACKUP_TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_default();
                entries.push(BookBackupInfo {
                    book: slug.clone(),
                    id: file_name.to_string(),
                    created_at,
                    path: path.clone(),
                });
            }
        }
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(entries)
    }

    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<Book, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let restored = load_book_from_path(&backup.path)?;
        let target = self.book_path(&backup.book);
        save_book_to_path(&restored, &target)?;
        tracing::info!(backup = %backup.id, "restored book from backup");
        Ok(restored)
    }
}

/// Saves a book to an arbitrary path on disk, replacing it atomically.
pub fn save_book_to_path(book: &Book, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_replacing(path, &serialize_book(book)?)
}

/// Loads a book from the provided filesystem path.
pub fn load_book_from_path(path: &Path) -> Result<Book, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

#[derive(Debug, Clone)]
pub struct BackupMetadata {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Lowercase ASCII letters and digits; anything else becomes `_`.
fn canonical_name(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if slug.chars().all(|ch| ch == '_') {
        "book".into()
    } else {
        slug
    }
}

/// Words of the note, lowercased and joined by dashes.
fn note_label(note: &str) -> Option<String> {
    let words: Vec<String> = note
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    (!words.is_empty()).then(|| words.join("-"))
}

/// Reads the `YYYYMMDD_HHMMSS` stamp out of a backup file name, wherever it sits.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", FILE_EXTENSION))?;
    let segments: Vec<&str> = trimmed.split('_').collect();
    segments.windows(2).rev().find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        if !is_digits(date, 8) || !is_digits(time, 6) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

/// `dir/stem.json`, or `dir/stem_nN.json` when that name is taken.
fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{}.{}", stem, FILE_EXTENSION));
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("{}_n{}.{}", stem, n, FILE_EXTENSION)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Writes a sibling `.tmp` file, syncs it and renames it over `path`.
fn write_replacing(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension(format!("{}.tmp", FILE_EXTENSION));
    let mut file = fs::File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;
    Ok(())
}

fn serialize_book(book: &Book) -> Result<String, CoreError> {
    serde_json::to_string_pretty(book).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_are_filesystem_safe() {
        assert_eq!(canonical_name("Household Book"), "household_book");
        assert_eq!(canonical_name("  ../ "), "book");
    }

    #[test]
    fn notes_become_dash_separated_labels() {
        assert_eq!(note_label("Before  import. v2"), Some("before-import-v2".into()));
        assert_eq!(note_label("  !! "), None);
    }

    #[test]
    fn timestamps_parse_with_or_without_note() {
        let plain = parse_backup_timestamp("tally_20240305_141516.json").unwrap();
        assert_eq!(plain.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-05 14:15:16");
        let noted = parse_backup_timestamp("my_book_20240305_141516_pre-import.json").unwrap();
        assert_eq!(noted, plain);
        assert!(parse_backup_timestamp("notes.json").is_none());
    }
}
