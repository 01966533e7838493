use crate::store::JsonStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const LIBRARY_KEY: &str = "games";

/// One game the user added: the id everything is keyed by, plus the
/// executable path the exe-relative parsers (ALI213, TENOKE, Goldberg)
/// search from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryGame {
    pub app_id: u32,
    pub name: String,
    pub exe_path: String,
}

pub struct GameLibrary {
    store: Mutex<JsonStore>,
    games: Mutex<Vec<LibraryGame>>,
}

pub type SharedLibrary = Arc<GameLibrary>;

impl GameLibrary {
    pub fn new(store: JsonStore) -> SharedLibrary {
        let games: Vec<LibraryGame> = store.get(LIBRARY_KEY).unwrap_or_default();
        Arc::new(Self {
            store: Mutex::new(store),
            games: Mutex::new(games),
        })
    }

    pub fn open(file_name: &str) -> Result<SharedLibrary, String> {
        Ok(Self::new(JsonStore::load(file_name)?))
    }

    /// Inserts or replaces the entry for a game id.
    pub fn upsert(&self, game: LibraryGame) -> Result<(), String> {
        {
            let mut games = self.games.lock().unwrap();
            games.retain(|g| g.app_id != game.app_id);
            games.push(game);
        }
        self.persist()
    }

    pub fn remove(&self, app_id: u32) -> Result<(), String> {
        self.games.lock().unwrap().retain(|g| g.app_id != app_id);
        self.persist()
    }

    pub fn get(&self, app_id: u32) -> Option<LibraryGame> {
        self.games
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.app_id == app_id)
            .cloned()
    }

    pub fn all(&self) -> Vec<LibraryGame> {
        self.games.lock().unwrap().clone()
    }

    fn persist(&self) -> Result<(), String> {
        let games = self.games.lock().unwrap().clone();
        let mut store = self.store.lock().unwrap();
        store.set(LIBRARY_KEY, &games)?;
        store.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn game(app_id: u32, exe: &str) -> LibraryGame {
        LibraryGame {
            app_id,
            name: format!("Game {}", app_id),
            exe_path: exe.to_string(),
        }
    }

    #[test]
    fn upsert_replaces_existing_entry() {
        let dir = TempDir::new().unwrap();
        let library = GameLibrary::new(JsonStore::load_from(dir.path().join("games.json")).unwrap());

        library.upsert(game(10, "/old/game.exe")).unwrap();
        library.upsert(game(10, "/new/game.exe")).unwrap();

        assert_eq!(library.all().len(), 1);
        assert_eq!(library.get(10).unwrap().exe_path, "/new/game.exe");
    }

    #[test]
    fn persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("games.json");

        {
            let library = GameLibrary::new(JsonStore::load_from(path.clone()).unwrap());
            library.upsert(game(10, "/a/game.exe")).unwrap();
        }

        let library = GameLibrary::new(JsonStore::load_from(path).unwrap());
        assert_eq!(library.get(10).unwrap().name, "Game 10");
    }

    #[test]
    fn remove_drops_entry() {
        let dir = TempDir::new().unwrap();
        let library = GameLibrary::new(JsonStore::load_from(dir.path().join("games.json")).unwrap());

        library.upsert(game(10, "/a/game.exe")).unwrap();
        library.remove(10).unwrap();
        assert!(library.get(10).is_none());
    }
}
