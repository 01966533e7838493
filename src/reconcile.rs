use crate::parsers::{self, ParserContext, ParserKind, UnlockTuple};
use crate::records::{GameAchievementRecord, RecordStore};
use crate::registry::SharedRegistry;
use std::fs;
use std::path::Path;

/// Merges parser output into the canonical record for a game.
///
/// Unlocks are monotonic: a tuple can flip a locked achievement to unlocked,
/// but nothing here ever relocks one. Keys with no matching definition are
/// ignored - the schema is the authority on what exists. Returns the updated
/// record when at least the record was found, `None` when no record is stored
/// for the game (the caller must fetch the schema first).
pub fn apply_unlocks(
    records: &RecordStore,
    app_id: u32,
    tuples: &[UnlockTuple],
) -> Result<Option<GameAchievementRecord>, String> {
    let Some(mut record) = records.get(app_id) else {
        return Ok(None);
    };

    let mut changed = false;
    for tuple in tuples {
        let Some(entry) = record
            .achievements
            .iter_mut()
            .find(|a| a.definition.key == tuple.key)
        else {
            continue;
        };
        if entry.state.unlocked {
            continue;
        }

        entry.state.unlocked = true;
        entry.state.unlocked_at = tuple.unlocked_at;
        // Secrets reveal themselves once earned.
        entry.definition.is_secret = false;
        changed = true;
    }

    if changed {
        records.put(&record)?;
    }
    Ok(Some(record))
}

/// Runs every format parser against a game and folds the results into its
/// record. Keys seen in more than one format keep the greater timestamp at
/// first unlock because formats run in fixed priority order and unlocks are
/// monotonic.
pub fn run_parser_pass(
    records: &RecordStore,
    ctx: &ParserContext,
) -> Result<Option<GameAchievementRecord>, String> {
    let mut all = Vec::new();

    for kind in ParserKind::ALL {
        if let Some(tuples) = parsers::parse(kind, ctx) {
            println!("  ✓ {} reported {} unlock(s)", kind, tuples.len());
            all.extend(tuples);
        }
    }

    apply_unlocks(records, ctx.app_id, &parsers::merge_by_key(all))
}

/// Relocks every achievement for a game and empties its tracked files on
/// disk, so the emulator starts from zero on the next session. The game's
/// registry entries are dropped too; the next parser pass re-discovers the
/// files once the emulator rewrites them.
pub fn reset_achievements(
    records: &RecordStore,
    registry: &SharedRegistry,
    app_id: u32,
) -> Result<(), String> {
    for path in registry.paths_for_app(app_id) {
        if Path::new(&path).is_file() {
            if let Err(e) = fs::write(&path, "") {
                eprintln!("  ⚠ Could not truncate {}: {}", path, e);
            }
        }
    }
    registry.remove_app(app_id)?;

    if let Some(mut record) = records.get(app_id) {
        for entry in &mut record.achievements {
            entry.state.unlocked = false;
            entry.state.unlocked_at = 0;
        }
        records.put(&record)?;
    }

    Ok(())
}

/// Deletes a game outright: record, tracked-file entries, everything.
pub fn remove_game(
    records: &RecordStore,
    registry: &SharedRegistry,
    app_id: u32,
) -> Result<(), String> {
    registry.remove_app(app_id)?;
    records.remove(app_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{test_record, SharedRecordStore};
    use crate::registry::TrackedFileRegistry;
    use crate::store::JsonStore;
    use tempfile::TempDir;

    fn open_records(dir: &TempDir) -> SharedRecordStore {
        RecordStore::new(JsonStore::load_from(dir.path().join("achievements.json")).unwrap())
    }

    fn tuple(key: &str, at: i64) -> UnlockTuple {
        UnlockTuple { key: key.into(), unlocked_at: at }
    }

    #[test]
    fn unlocks_matching_keys_only() {
        let dir = TempDir::new().unwrap();
        let records = open_records(&dir);
        records.put(&test_record(10, &["ACH_A", "ACH_B"])).unwrap();

        let updated = apply_unlocks(
            &records,
            10,
            &[tuple("ACH_A", 500), tuple("ACH_UNKNOWN", 600)],
        )
        .unwrap()
        .unwrap();

        assert!(updated.entry("ACH_A").unwrap().state.unlocked);
        assert_eq!(updated.entry("ACH_A").unwrap().state.unlocked_at, 500);
        assert!(!updated.entry("ACH_B").unwrap().state.unlocked);
        assert_eq!(updated.achievements.len(), 2);
    }

    #[test]
    fn already_unlocked_keeps_original_timestamp() {
        let dir = TempDir::new().unwrap();
        let records = open_records(&dir);
        records.put(&test_record(10, &["ACH_A"])).unwrap();

        apply_unlocks(&records, 10, &[tuple("ACH_A", 500)]).unwrap();
        let updated = apply_unlocks(&records, 10, &[tuple("ACH_A", 900)])
            .unwrap()
            .unwrap();

        assert_eq!(updated.entry("ACH_A").unwrap().state.unlocked_at, 500);
    }

    #[test]
    fn metadata_survives_merge() {
        let dir = TempDir::new().unwrap();
        let records = open_records(&dir);
        records.put(&test_record(10, &["ACH_A"])).unwrap();

        let updated = apply_unlocks(&records, 10, &[tuple("ACH_A", 500)])
            .unwrap()
            .unwrap();
        let def = &updated.entry("ACH_A").unwrap().definition;

        assert_eq!(def.display_name, "Achievement ACH_A");
        assert_eq!(def.description, "desc");
        assert_eq!(def.icon_unlocked.as_deref(), Some("icons/ACH_A.jpg"));
        assert_eq!(def.global_unlock_percent, Some(42.0));
    }

    #[test]
    fn missing_record_returns_none_without_creating_one() {
        let dir = TempDir::new().unwrap();
        let records = open_records(&dir);

        let result = apply_unlocks(&records, 99, &[tuple("ACH_A", 1)]).unwrap();
        assert!(result.is_none());
        assert!(records.get(99).is_none());
    }

    #[test]
    fn reset_relocks_and_truncates_tracked_files() {
        let dir = TempDir::new().unwrap();
        let records = open_records(&dir);
        let registry =
            TrackedFileRegistry::new(JsonStore::load_from(dir.path().join("tracked.json")).unwrap());

        records.put(&test_record(10, &["ACH_A"])).unwrap();
        apply_unlocks(&records, 10, &[tuple("ACH_A", 500)]).unwrap();

        let ini = dir.path().join("achievements.ini");
        std::fs::write(&ini, "[ACH_A]\nAchieved=1\n").unwrap();
        registry.add(10, &ini.to_string_lossy()).unwrap();

        reset_achievements(&records, &registry, 10).unwrap();

        let record = records.get(10).unwrap();
        assert!(!record.entry("ACH_A").unwrap().state.unlocked);
        assert_eq!(record.entry("ACH_A").unwrap().state.unlocked_at, 0);
        assert_eq!(std::fs::read_to_string(&ini).unwrap(), "");
        assert!(registry.paths_for_app(10).is_empty());
    }

    #[test]
    fn remove_game_clears_record_and_registry() {
        let dir = TempDir::new().unwrap();
        let records = open_records(&dir);
        let registry =
            TrackedFileRegistry::new(JsonStore::load_from(dir.path().join("tracked.json")).unwrap());

        records.put(&test_record(10, &["ACH_A"])).unwrap();
        registry.add(10, "/a/one.ini").unwrap();

        remove_game(&records, &registry, 10).unwrap();

        assert!(records.get(10).is_none());
        assert!(registry.paths_for_app(10).is_empty());
    }
}
