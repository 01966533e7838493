use crate::store::JsonStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const REGISTRY_KEY: &str = "trackedAchievementsFiles";

/// One achievement file a parser has located on disk. Unique by `file_path`;
/// the watcher is armed over exactly this set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedFile {
    pub appid: u32,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

pub struct TrackedFileRegistry {
    store: Mutex<JsonStore>,
    files: Mutex<Vec<TrackedFile>>,
}

pub type SharedRegistry = Arc<TrackedFileRegistry>;

impl TrackedFileRegistry {
    pub fn new(store: JsonStore) -> SharedRegistry {
        let files: Vec<TrackedFile> = store.get(REGISTRY_KEY).unwrap_or_default();
        Arc::new(Self {
            store: Mutex::new(store),
            files: Mutex::new(files),
        })
    }

    pub fn open(file_name: &str) -> Result<SharedRegistry, String> {
        Ok(Self::new(JsonStore::load(file_name)?))
    }

    /// Registers a located achievement file. Idempotent: a path already in
    /// the registry (exact string match) is skipped without a write.
    pub fn add(&self, appid: u32, file_path: &str) -> Result<(), String> {
        {
            let mut files = self.files.lock().unwrap();
            if files.iter().any(|f| f.file_path == file_path) {
                return Ok(());
            }
            files.push(TrackedFile {
                appid,
                file_path: file_path.to_string(),
            });
        }
        self.persist()
    }

    /// Exact-path lookup used to map a watcher event back to a game.
    pub fn app_for_path(&self, file_path: &str) -> Option<u32> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.file_path == file_path)
            .map(|f| f.appid)
    }

    pub fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.file_path.clone())
            .collect()
    }

    pub fn paths_for_app(&self, appid: u32) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.appid == appid)
            .map(|f| f.file_path.clone())
            .collect()
    }

    pub fn remove_app(&self, appid: u32) -> Result<(), String> {
        self.files.lock().unwrap().retain(|f| f.appid != appid);
        self.persist()
    }

    fn persist(&self) -> Result<(), String> {
        let files = self.files.lock().unwrap().clone();
        let mut store = self.store.lock().unwrap();
        store.set(REGISTRY_KEY, &files)?;
        store.save()
    }
}
