//! Integer key-value storage (XDG config or ~/.config/swipetui/save).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const APP_DIR: &str = "swipetui";
const FILENAME: &str = "save";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the game keeps its save data. Missing keys read as `None`; callers pick defaults.
pub trait KeyValueStore {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&mut self, key: &str, value: i64);
    /// Persist pending writes.
    fn flush(&mut self) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get_int(&self, key: &str) -> Option<i64> {
        (**self).get_int(key)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        (**self).set_int(key, value);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        (**self).flush()
    }
}

/// Default save path (config dir / swipetui / save).
pub fn default_save_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join(APP_DIR).join(FILENAME)
}

/// `key=value` lines on disk, rewritten whole on flush.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, i64>,
    dirty: bool,
}

impl FileStore {
    /// Load from `path`. A missing file is an empty store; malformed lines are skipped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(content) => parse_lines(&content, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no save file yet");
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_out(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::File::create(&self.path)?;
        for (key, value) in &self.values {
            writeln!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

fn parse_lines(content: &[u8], path: &Path) -> BTreeMap<String, i64> {
    let mut values = BTreeMap::new();
    for (n, line) in BufReader::new(content).lines().enumerate() {
        let Ok(line) = line else { continue };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = line
            .split_once('=')
            .and_then(|(k, v)| Some((k.trim(), v.trim().parse::<i64>().ok()?)));
        match parsed {
            Some((key, value)) if !key.is_empty() => {
                values.insert(key.to_string(), value);
            }
            _ => warn!(path = %path.display(), line = n + 1, "skipping malformed save line"),
        }
    }
    values
}

impl KeyValueStore for FileStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) {
        if self.values.insert(key.to_string(), value) != Some(value) {
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        self.write_out().map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        Ok(())
    }
}

/// Volatile store for `--no-save` sessions and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, i64>,
    flushes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.flushes += 1;
        Ok(())
    }
}
