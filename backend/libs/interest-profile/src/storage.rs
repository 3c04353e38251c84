//! Persistence adapters for interest profiles
//!
//! The store only needs a tiny key-value surface with per-key expiry:
//! - `CookieStorage`: one HTTP request's cookies, producing a `Set-Cookie` update
//! - `MemoryStorage`: process-local map, used in tests and embedded callers
//! - `FileStorage`: one JSON envelope per key on disk
//! - `UnavailableStorage`: no storage medium at all

use crate::clock::{Clock, SystemClock};
use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Key-value persistence with expiry
pub trait ProfileStorage: Send + Sync {
    /// Read the stored value. Absent or expired keys yield `None`.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the stored value, keeping it until `expires_at`.
    fn write(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> StorageResult<()>;

    /// Forget the key immediately.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============= Cookie Storage =============

/// Change to send back to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    Set {
        name: String,
        value: String,
        expires_at: DateTime<Utc>,
    },
    Remove {
        name: String,
    },
}

/// Cookies of a single request/response exchange.
///
/// Values are kept exactly as they travel on the wire; decoding is the codec's job.
#[derive(Debug, Default)]
pub struct CookieStorage {
    jar: Mutex<CookieJarState>,
}

#[derive(Debug, Default)]
struct CookieJarState {
    values: HashMap<String, String>,
    updates: Vec<CookieUpdate>,
}

impl CookieStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jar holding the request's already parsed cookies.
    ///
    /// When a name repeats, the first value wins, as browsers send the most
    /// specific path first.
    pub fn from_pairs<I, K, V>(cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        for (name, value) in cookies {
            values.entry(name.into()).or_insert_with(|| value.into());
        }

        Self {
            jar: Mutex::new(CookieJarState {
                values,
                updates: Vec::new(),
            }),
        }
    }

    /// Pending updates, latest per cookie name, in the order they were last touched
    pub fn take_updates(&self) -> Vec<CookieUpdate> {
        let mut jar = lock(&self.jar);
        let updates = std::mem::take(&mut jar.updates);

        let mut latest: Vec<CookieUpdate> = Vec::new();
        for update in updates {
            let name = match &update {
                CookieUpdate::Set { name, .. } | CookieUpdate::Remove { name } => name.clone(),
            };
            latest.retain(|u| match u {
                CookieUpdate::Set { name: n, .. } | CookieUpdate::Remove { name: n } => *n != name,
            });
            latest.push(update);
        }
        latest
    }
}

impl ProfileStorage for CookieStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.jar).values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> StorageResult<()> {
        let mut jar = lock(&self.jar);
        jar.values.insert(key.to_string(), value.to_string());
        jar.updates.push(CookieUpdate::Set {
            name: key.to_string(),
            value: value.to_string(),
            expires_at,
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut jar = lock(&self.jar);
        jar.values.remove(key);
        jar.updates.push(CookieUpdate::Remove {
            name: key.to_string(),
        });
        Ok(())
    }
}

// ============= Memory Storage =============

#[derive(Clone)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, (String, DateTime<Utc>)>>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Stored expiry for a key, for inspection in tests
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        lock(&self.entries).get(key).map(|(_, expires_at)| *expires_at)
    }
}

impl ProfileStorage for MemoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= self.clock.now() => {
                debug!(key = %key, "Stored profile expired");
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> StorageResult<()> {
        lock(&self.entries).insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// ============= File Storage =============

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEnvelope {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Stores each key as `<dir>/<key>.json`
pub struct FileStorage {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            clock,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl ProfileStorage for FileStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let envelope: FileEnvelope = serde_json::from_str(&data)?;
        if envelope.expires_at <= self.clock.now() {
            debug!(path = %path.display(), "Stored profile expired");
            self.remove(key)?;
            return Ok(None);
        }

        Ok(Some(envelope.value))
    }

    fn write(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;

        let envelope = FileEnvelope {
            value: value.to_string(),
            expires_at,
        };
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&envelope)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============= Unavailable Storage =============

/// No storage medium, e.g. a render pass without a client cookie jar
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl ProfileStorage for UnavailableStorage {
    fn read(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("no storage medium".to_string()))
    }

    fn write(&self, _key: &str, _value: &str, _expires_at: DateTime<Utc>) -> StorageResult<()> {
        Err(StorageError::Unavailable("no storage medium".to_string()))
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("no storage medium".to_string()))
    }
}
