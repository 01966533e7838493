use crate::store::JsonStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Schema-sourced achievement metadata. Immutable once fetched; the
/// reconciliation engine only ever touches the paired state (plus the
/// secret flag, which is cleared on unlock).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_secret: bool,
    #[serde(default)]
    pub icon_unlocked: Option<String>,
    #[serde(default)]
    pub icon_locked: Option<String>,
    /// Global unlock rarity, 0-100. Lower = rarer.
    #[serde(default)]
    pub global_unlock_percent: Option<f32>,
}

/// Per-user unlock state. Invariant: `unlocked == (unlocked_at > 0)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementState {
    pub unlocked: bool,
    /// Epoch seconds; 0 = never unlocked.
    pub unlocked_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementEntry {
    pub definition: AchievementDefinition,
    pub state: AchievementState,
}

/// Canonical per-game achievement record, persisted whole under
/// `achievements_<appId>`. Source of truth for "what is unlocked" -
/// everything downstream (scoring, UI) is a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAchievementRecord {
    pub game_id: u32,
    pub game_name: String,
    #[serde(default)]
    pub game_version: String,
    pub achievements: Vec<AchievementEntry>,
}

impl GameAchievementRecord {
    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.state.unlocked).count()
    }

    pub fn completion_percent(&self) -> f64 {
        if self.achievements.is_empty() {
            return 0.0;
        }
        self.unlocked_count() as f64 / self.achievements.len() as f64 * 100.0
    }

    pub fn entry(&self, key: &str) -> Option<&AchievementEntry> {
        self.achievements.iter().find(|a| a.definition.key == key)
    }
}

fn record_key(app_id: u32) -> String {
    format!("achievements_{}", app_id)
}

/// Repository for canonical records: JSON-file persistence plus a broadcast
/// channel so in-process subscribers re-render on every write.
pub struct RecordStore {
    store: Mutex<JsonStore>,
    updates: broadcast::Sender<u32>,
}

pub type SharedRecordStore = Arc<RecordStore>;

impl RecordStore {
    pub fn new(store: JsonStore) -> SharedRecordStore {
        let (updates, _) = broadcast::channel(64);
        Arc::new(Self {
            store: Mutex::new(store),
            updates,
        })
    }

    pub fn open(file_name: &str) -> Result<SharedRecordStore, String> {
        Ok(Self::new(JsonStore::load(file_name)?))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<u32> {
        self.updates.subscribe()
    }

    pub fn get(&self, app_id: u32) -> Option<GameAchievementRecord> {
        self.store.lock().unwrap().get(&record_key(app_id))
    }

    /// Persists the full record (all fields, never a diff) and signals
    /// subscribers.
    pub fn put(&self, record: &GameAchievementRecord) -> Result<(), String> {
        {
            let mut store = self.store.lock().unwrap();
            store.set(&record_key(record.game_id), record)?;
            store.save()?;
        }
        let _ = self.updates.send(record.game_id);
        Ok(())
    }

    pub fn remove(&self, app_id: u32) -> Result<(), String> {
        {
            let mut store = self.store.lock().unwrap();
            store.delete(&record_key(app_id));
            store.save()?;
        }
        let _ = self.updates.send(app_id);
        Ok(())
    }

    pub fn game_ids(&self) -> Vec<u32> {
        self.store
            .lock()
            .unwrap()
            .keys()
            .iter()
            .filter_map(|k| k.strip_prefix("achievements_").and_then(|id| id.parse().ok()))
            .collect()
    }
}

#[cfg(test)]
pub fn test_record(app_id: u32, keys: &[&str]) -> GameAchievementRecord {
    GameAchievementRecord {
        game_id: app_id,
        game_name: format!("Game {}", app_id),
        game_version: "1.0".to_string(),
        achievements: keys
            .iter()
            .map(|k| AchievementEntry {
                definition: AchievementDefinition {
                    key: k.to_string(),
                    display_name: format!("Achievement {}", k),
                    description: "desc".to_string(),
                    is_secret: false,
                    icon_unlocked: Some(format!("icons/{}.jpg", k)),
                    icon_locked: Some(format!("icons/{}_gray.jpg", k)),
                    global_unlock_percent: Some(42.0),
                },
                state: AchievementState::default(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SharedRecordStore {
        RecordStore::new(JsonStore::load_from(dir.path().join("achievements.json")).unwrap())
    }

    #[test]
    fn put_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let record = test_record(440, &["ACH_A", "ACH_B"]);

        store.put(&record).unwrap();
        assert_eq!(store.get(440), Some(record));
        assert_eq!(store.get(441), None);
    }

    #[test]
    fn put_signals_subscribers() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut rx = store.subscribe();

        store.put(&test_record(10, &["A"])).unwrap();
        assert_eq!(rx.try_recv(), Ok(10));
    }

    #[test]
    fn game_ids_lists_stored_records() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.put(&test_record(10, &["A"])).unwrap();
        store.put(&test_record(20, &["B"])).unwrap();

        let mut ids = store.game_ids();
        ids.sort();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn completion_percent_empty_record_is_zero() {
        let record = test_record(1, &[]);
        assert_eq!(record.completion_percent(), 0.0);
    }
}
