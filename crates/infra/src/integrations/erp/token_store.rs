//! File-backed bearer token store
//!
//! The token lives as one `KEY=value` line in an environment-style file so
//! it survives restarts and can be shared with other portal processes. The
//! store is a best-effort cache: I/O failures are logged and swallowed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use erpsync_core::TokenStore;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Token store backed by an environment-style file plus an in-memory copy.
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
    cached: Mutex<Option<String>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self { path: path.into(), key: key.into(), cached: Mutex::new(None) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_from_file(&self) -> Option<String> {
        let iter = match dotenvy::from_path_iter(&self.path) {
            Ok(iter) => iter,
            Err(err) if is_not_found(&err) => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to open token file");
                return None;
            }
        };

        for item in iter {
            match item {
                Ok((key, value)) if key == self.key => return non_blank(value),
                Ok(_) => {}
                Err(err) => {
                    warn!(path = %self.path.display(), error = %err, "skipping malformed token file line");
                }
            }
        }
        None
    }

    /// Rewrite the file with the token line replaced (or removed when
    /// `token` is `None`). Other lines are preserved.
    fn write_line(&self, token: Option<&str>) {
        let existing = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read token file");
                return;
            }
        };

        let mut lines: Vec<String> = existing
            .lines()
            .filter(|line| !self.is_token_line(line))
            .map(str::to_string)
            .collect();

        if let Some(token) = token {
            lines.push(format!("{}={}", self.key, quote_value(token)));
        }

        let mut contents = lines.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %err, "failed to create token directory");
                return;
            }
        }

        if let Err(err) = std::fs::write(&self.path, contents) {
            warn!(path = %self.path.display(), error = %err, "failed to write token file");
        }
    }

    fn is_token_line(&self, line: &str) -> bool {
        let line = line.trim_start();
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        line.strip_prefix(self.key.as_str())
            .map(|rest| rest.trim_start().starts_with('='))
            .unwrap_or(false)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        if let Some(token) = self.cached.lock().clone() {
            return Some(token);
        }

        let token = self.read_from_file()?;
        *self.cached.lock() = Some(token.clone());
        Some(token)
    }

    fn set(&self, token: &str) {
        let Some(token) = non_blank(token.to_string()) else {
            self.clear();
            return;
        };

        *self.cached.lock() = Some(token.clone());
        self.write_line(Some(&token));
        debug!(path = %self.path.display(), "stored ERP token");
    }

    fn clear(&self) {
        *self.cached.lock() = None;
        self.write_line(None);
        debug!(path = %self.path.display(), "cleared ERP token");
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_not_found(err: &dotenvy::Error) -> bool {
    matches!(err, dotenvy::Error::Io(io) if io.kind() == ErrorKind::NotFound)
}

/// Single quotes keep the value literal on read (no `$VAR` expansion). An
/// embedded `'` closes the quote, is emitted inside `"'"`, and reopens it.
fn quote_value(token: &str) -> String {
    let plain = token.chars().all(|c| c.is_ascii_alphanumeric() || "-_.~+/=:".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r#"'"'"'"#))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const KEY: &str = "ERP_ACCESS_TOKEN";

    fn store_in(dir: &TempDir) -> FileTokenStore {
        FileTokenStore::new(dir.path().join(".erp-token"), KEY)
    }

    #[test]
    fn missing_file_means_no_token() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).get(), None);
    }

    #[test]
    fn set_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        store_in(&dir).set("eyJhbGciOi.abc-123_x");

        let fresh = store_in(&dir);
        assert_eq!(fresh.get().as_deref(), Some("eyJhbGciOi.abc-123_x"));
    }

    #[test]
    fn set_preserves_unrelated_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".erp-token");
        std::fs::write(&path, "OTHER=1\nERP_ACCESS_TOKEN=old\n# note\n").unwrap();

        let store = FileTokenStore::new(&path, KEY);
        store.set("new-token");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("OTHER=1"));
        assert!(contents.contains("# note"));
        assert!(contents.contains("ERP_ACCESS_TOKEN=new-token"));
        assert!(!contents.contains("old"));
    }

    #[test]
    fn clear_removes_line_and_cache() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("tok");
        store.clear();

        assert_eq!(store.get(), None);
        assert_eq!(store_in(&dir).get(), None);
    }

    #[test]
    fn blank_values_are_absent_and_blank_set_clears() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".erp-token");
        std::fs::write(&path, "ERP_ACCESS_TOKEN=\n").unwrap();
        let store = FileTokenStore::new(&path, KEY);
        assert_eq!(store.get(), None);

        store.set("tok");
        store.set("   ");
        assert_eq!(store.get(), None);
    }

    #[test]
    fn tokens_with_special_characters_round_trip() {
        let tokens = [
            "a b#c\"d",
            "ab$HOME.cd",
            "${HOME}x",
            "trailing$",
            "it's $PATH",
            r"back\slash\$n",
        ];
        for token in tokens {
            let dir = TempDir::new().unwrap();
            store_in(&dir).set(token);
            assert_eq!(store_in(&dir).get().as_deref(), Some(token), "token {token:?}");
        }
    }

    #[test]
    fn unwritable_location_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let store = FileTokenStore::new(blocker.join("nested/.erp-token"), KEY);
        store.set("tok");
        // The in-memory copy still serves the process.
        assert_eq!(store.get().as_deref(), Some("tok"));
    }
}
