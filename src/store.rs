use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// JSON-file backed key/value store. One file per store name, holding a flat
/// map of string key -> arbitrary JSON value. Writes go through `save()` so a
/// batch of `set` calls costs a single file write.
pub struct JsonStore {
    file_path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonStore {
    /// Opens (or creates) the named store under the application data
    /// directory, e.g. `load("achievements.json")`.
    pub fn load(file_name: &str) -> Result<Self, String> {
        let dir = Self::data_dir()?;
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
        Self::load_from(dir.join(file_name))
    }

    pub fn load_from(file_path: PathBuf) -> Result<Self, String> {
        let entries = match fs::read_to_string(&file_path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => BTreeMap::new(),
        };

        Ok(Self { file_path, entries })
    }

    fn data_dir() -> Result<PathBuf, String> {
        dirs::data_dir()
            .map(|d| d.join("trophyvault"))
            .ok_or_else(|| "Could not determine data directory".to_string())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), String> {
        let value = serde_json::to_value(value)
            .map_err(|e| format!("Failed to serialize value for '{}': {}", key, e))?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn save(&self) -> Result<(), String> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| format!("Failed to serialize store: {}", e))?;
        fs::write(&self.file_path, json)
            .map_err(|e| format!("Failed to write store file: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::load_from(dir.path().join("test.json")).unwrap();

        store.set("answer", &42u32).unwrap();
        assert_eq!(store.get::<u32>("answer"), Some(42));
        assert_eq!(store.get::<u32>("missing"), None);
    }

    #[test]
    fn survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.json");

        {
            let mut store = JsonStore::load_from(path.clone()).unwrap();
            store.set("game_10", &"Half-Life").unwrap();
            store.save().unwrap();
        }

        let store = JsonStore::load_from(path).unwrap();
        assert_eq!(store.get::<String>("game_10").as_deref(), Some("Half-Life"));
    }

    #[test]
    fn delete_removes_key() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::load_from(dir.path().join("test.json")).unwrap();

        store.set("k", &1u8).unwrap();
        assert!(store.delete("k"));
        assert!(!store.delete("k"));
        assert_eq!(store.get::<u8>("k"), None);
    }

    #[test]
    fn corrupt_file_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonStore::load_from(path).unwrap();
        assert!(store.keys().is_empty());
    }
}
