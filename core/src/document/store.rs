//! Backing stores for the stats document.
//!
//! [`DocumentStore`] is the whole contract the engine needs: load a fresh
//! copy, save a whole document back. [`YamlFileStore`] is the production
//! store; [`MemoryStore`] is the in-memory fake used in tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::tree::Document;
use crate::error::{Result, StatsError};


/// Load/save access to the persisted stats document.
///
/// `load` must be an idempotent reload: two loads with no save in between
/// return equal documents. `save` persists the whole document at once.
pub trait DocumentStore: Send + Sync {
    fn load(&self) -> Result<Document>;

    fn save(&self, doc: &Document) -> Result<()>;

    /// Short human-readable location, used in log lines.
    fn location(&self) -> String;
}


// ---------------------------------------------------------------------------
// YAML file
// ---------------------------------------------------------------------------

/// Stats document persisted as a single YAML file.
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    path: PathBuf,
}

impl YamlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        YamlFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stats.yml".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

impl DocumentStore for YamlFileStore {
    /// A missing file loads as an empty document.
    fn load(&self) -> Result<Document> {
        if !self.path.exists() {
            return Ok(Document::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| StatsError::io(&self.path, e))?;
        Document::from_yaml_str(&content).map_err(|source| StatsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write to a temp file beside the target, then rename over it.
    fn save(&self, doc: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StatsError::io(parent, e))?;
            }
        }

        let yaml = doc.to_yaml_string()?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, yaml).map_err(|e| StatsError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StatsError::io(&self.path, e))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}


// ---------------------------------------------------------------------------
// In-memory fake
// ---------------------------------------------------------------------------

type SaveHook = Box<dyn Fn(&Document) + Send + Sync>;

/// In-memory store holding the document as YAML text, so loads and saves
/// go through the same serialization as the file store.
///
/// Counts loads and saves, can be told to fail saves, and can run a hook
/// at the start of every save (tests use it to pause a flush mid-save).
pub struct MemoryStore {
    contents: Mutex<String>,
    loads: AtomicUsize,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    save_hook: Mutex<Option<SaveHook>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::with_yaml("")
    }

    /// Create a store pre-loaded with YAML text.
    pub fn with_yaml(yaml: &str) -> Self {
        MemoryStore {
            contents: Mutex::new(yaml.to_string()),
            loads: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            save_hook: Mutex::new(None),
        }
    }

    /// Current persisted YAML text.
    pub fn yaml(&self) -> String {
        self.contents.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_save_hook(&self, hook: impl Fn(&Document) + Send + Sync + 'static) {
        *self.save_hook.lock() = Some(Box::new(hook));
    }

    pub fn clear_save_hook(&self) {
        *self.save_hook.lock() = None;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Document> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let content = self.contents.lock().clone();
        Document::from_yaml_str(&content).map_err(|source| StatsError::Parse {
            path: PathBuf::from(self.location()),
            source,
        })
    }

    fn save(&self, doc: &Document) -> Result<()> {
        if let Some(hook) = self.save_hook.lock().as_ref() {
            hook(doc);
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StatsError::io(
                self.location(),
                std::io::Error::new(std::io::ErrorKind::Other, "injected save failure"),
            ));
        }
        let yaml = doc.to_yaml_string()?;
        *self.contents.lock() = yaml;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StatPath;
    use crate::types::StatValue;

    fn path(s: &str) -> StatPath {
        StatPath::parse(s).unwrap()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlFileStore::new(dir.path().join("players_stats.yml"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlFileStore::new(dir.path().join("players_stats.yml"));
        let mut doc = Document::new();
        doc.set_stat(&path("sec.e1.Points"), &StatValue::Integer(10));
        doc.set_stat(&path("sec.e1.Ratio"), &StatValue::Float(2.0));
        store.save(&doc).unwrap();

        let back = store.load().unwrap();
        assert_eq!(back.get_stat(&path("sec.e1.Points")), Some(StatValue::Integer(10)));
        assert_eq!(back.get_stat(&path("sec.e1.Ratio")), Some(StatValue::Float(2.0)));
    }

    #[test]
    fn save_creates_parent_dirs_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("deeper").join("stats.yml");
        let store = YamlFileStore::new(&file);
        store.save(&Document::new()).unwrap();
        assert!(file.exists());
        assert!(!file.with_file_name(".stats.yml.tmp").exists());
    }

    #[test]
    fn reload_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("stats.yml");
        fs::write(&file, "sec:\n  e1:\n    Points: 7\n    Username: Alex\n").unwrap();
        let store = YamlFileStore::new(&file);
        let first = store.load().unwrap();
        let second = store.load().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("stats.yml");
        fs::write(&file, "sec: [unclosed\n").unwrap();
        match YamlFileStore::new(&file).load() {
            Err(StatsError::Parse { path, .. }) => assert_eq!(path, file),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn memory_store_counts_and_fails_on_demand() {
        let store = MemoryStore::with_yaml("sec:\n  e1:\n    Points: 1\n");
        let doc = store.load().unwrap();
        assert_eq!(store.load_count(), 1);

        store.save(&doc).unwrap();
        assert_eq!(store.save_count(), 1);

        store.set_fail_saves(true);
        assert!(store.save(&doc).is_err());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn memory_store_reload_is_idempotent() {
        let store = MemoryStore::with_yaml("a:\n  b:\n    c: 1.5\n");
        assert_eq!(store.load().unwrap(), store.load().unwrap());
    }

    #[test]
    fn memory_store_runs_save_hook() {
        use std::sync::Arc;
        let store = MemoryStore::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        store.set_save_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        store.save(&Document::new()).unwrap();
        store.clear_save_hook();
        store.save(&Document::new()).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
