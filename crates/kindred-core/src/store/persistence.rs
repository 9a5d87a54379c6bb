//! On-disk notification list, one JSON file per user.
//!
//! Writes go to a temp file that is then renamed over the real one, so an
//! interrupted save never leaves a half-written list behind.

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::NOTIFICATIONS_DIR;
use crate::error::StorageError;
use crate::models::Notification;

#[derive(Debug, Clone)]
pub struct NotificationFile {
    path: PathBuf,
}

impl NotificationFile {
    pub fn new(data_dir: &Path, user_id: &str) -> Self {
        let file_name = format!("{}.json", sanitize_user_id(user_id));
        Self {
            path: data_dir.join(NOTIFICATIONS_DIR).join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored list. A missing file is an empty list, not an error.
    pub fn load(&self) -> Result<Vec<Notification>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StorageError::Read(e.to_string())),
        }
    }

    pub fn save(&self, entries: &[Notification]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Write(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, json).map_err(|e| StorageError::Write(e.to_string()))?;
        fs::rename(&temp, &self.path).map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(())
    }

    /// Move an unreadable file aside (`<user>.json.corrupt`) so the next save
    /// does not overwrite it. Returns where it went.
    pub fn quarantine(&self) -> Result<PathBuf, StorageError> {
        let target = self.path.with_extension("json.corrupt");
        fs::rename(&self.path, &target).map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(target)
    }

    /// Ignores errors (e.g. file already absent).
    pub fn remove(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Keep user ids from escaping the notifications directory.
fn sanitize_user_id(user_id: &str) -> String {
    let cleaned: String = user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationType, Payload};
    use tempfile::tempdir;

    fn sample(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationType::Like,
            title: "New like".to_string(),
            body: "Someone liked you".to_string(),
            payload: Payload::new(),
            created_at: 100,
            expires_at: Some(200),
            read_at: None,
            dedupe_key: "like:unknown".to_string(),
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let file = NotificationFile::new(dir.path(), "u1");
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let file = NotificationFile::new(dir.path(), "u1");
        file.save(&[sample("b"), sample("a")]).unwrap();

        let loaded = file.load().unwrap();
        let ids: Vec<&str> = loaded.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(!file.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let file = NotificationFile::new(dir.path(), "u1");
        fs::create_dir_all(file.path().parent().unwrap()).unwrap();
        fs::write(file.path(), "{not json").unwrap();
        assert!(matches!(file.load(), Err(StorageError::Parse(_))));
    }

    #[test]
    fn test_quarantine_keeps_corrupt_contents() {
        let dir = tempdir().unwrap();
        let file = NotificationFile::new(dir.path(), "u1");
        fs::create_dir_all(file.path().parent().unwrap()).unwrap();
        fs::write(file.path(), "{not json").unwrap();

        let moved = file.quarantine().unwrap();
        assert!(!file.path().exists());
        assert_eq!(fs::read_to_string(&moved).unwrap(), "{not json");
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_user_id_cannot_escape_directory() {
        let dir = tempdir().unwrap();
        let file = NotificationFile::new(dir.path(), "../../etc/passwd");
        assert_eq!(
            file.path().parent().unwrap(),
            dir.path().join(NOTIFICATIONS_DIR)
        );
    }
}
