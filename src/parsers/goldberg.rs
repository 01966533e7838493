use super::bracket::BracketFormat;
use super::{merge_by_key, read_candidate, ParserContext, UnlockTuple};
use crate::appid::from_steam_appid_txt;
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;

/// File names probed inside each save root, in order. The first hit per root
/// wins; roots are independent and their tuples are merged by key.
const CANDIDATE_FILES: [&str; 4] = [
    "achievements.json",
    "achievements.ini",
    "achiev.ini",
    "stats.ini",
];

/// Goldberg and its forks (GSE, EMPRESS) scatter saves across several roots
/// under AppData/Roaming and the public documents folder. The save folder is
/// keyed by app id, which `steam_settings/steam_appid.txt` can override.
pub fn parse(ctx: &ParserContext) -> Option<Vec<UnlockTuple>> {
    let app_id = from_steam_appid_txt(&ctx.exe_path).unwrap_or(ctx.app_id);
    let id = app_id.to_string();

    let roots: [PathBuf; 4] = [
        ctx.app_data_dir.join("GSE Saves").join(&id),
        ctx.app_data_dir.join("Goldberg SteamEmu Saves").join(&id),
        ctx.app_data_dir.join("EMPRESS").join("remote").join(&id),
        ctx.public_documents()
            .join("EMPRESS")
            .join("remote")
            .join(&id),
    ];

    let now = Utc::now().timestamp();
    let mut tuples = Vec::new();
    let mut found_any = false;

    for root in &roots {
        for name in &CANDIDATE_FILES {
            let path = root.join(name);
            let Some(content) = read_candidate(&path) else {
                continue;
            };
            ctx.track(&path);
            found_any = true;

            if *name == "achievements.json" {
                tuples.extend(parse_json_content(&content, now));
            } else {
                tuples.extend(parse_ini_content(&content, now));
            }
            break;
        }
    }

    if found_any {
        Some(merge_by_key(tuples))
    } else {
        None
    }
}

pub fn parse_ini_content(content: &str, now: i64) -> Vec<UnlockTuple> {
    BracketFormat::goldberg_ini().scan(content, now)
}

/// The two supported achievements.json shapes. Detection is explicit so a
/// third, unknown layout fails loudly instead of half-parsing.
enum GoldbergJson {
    /// GSE flat map: `{ "ACH_X": { "earned": true, "earned_time": 123 } }`
    GseFlatMap(serde_json::Map<String, Value>),
    /// Standard map: `{ "achievements": { "ACH_X": { "unlocked": true,
    /// "unlock_time": 123 } } }`
    StandardAchievementsMap(serde_json::Map<String, Value>),
}

fn detect_shape(root: Value) -> Option<GoldbergJson> {
    let Value::Object(map) = root else {
        return None;
    };

    if let Some(Value::Object(inner)) = map.get("achievements") {
        return Some(GoldbergJson::StandardAchievementsMap(inner.clone()));
    }
    if map.values().all(|v| matches!(v, Value::Object(_))) {
        return Some(GoldbergJson::GseFlatMap(map));
    }

    None
}

fn tuple_from_fields(
    key: &str,
    fields: &serde_json::Map<String, Value>,
    flags: &[&str],
    time_fields: &[&str],
    now: i64,
) -> Option<UnlockTuple> {
    let earned = flags
        .iter()
        .filter_map(|f| fields.get(*f))
        .any(|v| v.as_bool() == Some(true));
    if !earned {
        return None;
    }

    let unlocked_at = time_fields
        .iter()
        .filter_map(|f| fields.get(*f))
        .filter_map(Value::as_i64)
        .find(|&t| t > 0)
        .unwrap_or(now);

    Some(UnlockTuple {
        key: key.to_string(),
        unlocked_at,
    })
}

pub fn parse_json_content(content: &str, now: i64) -> Vec<UnlockTuple> {
    let root: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            println!("  ⚠ Unreadable Goldberg achievements.json: {}", e);
            return Vec::new();
        }
    };

    let (entries, flags, time_fields): (_, &[&str], &[&str]) = match detect_shape(root) {
        Some(GoldbergJson::GseFlatMap(map)) => (map, &["earned"], &["earned_time"]),
        Some(GoldbergJson::StandardAchievementsMap(map)) => (
            map,
            &["earned", "unlocked", "achieved"],
            &["unlock_time", "unlocktime", "time"],
        ),
        None => {
            println!("  ⚠ Unknown Goldberg achievements.json shape, skipping");
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|(key, entry)| {
            let Value::Object(fields) = entry else {
                return None;
            };
            tuple_from_fields(key, fields, flags, time_fields, now)
        })
        .collect()
}

/// Keys from a JSON payload whose unlock time falls within `window` seconds
/// of `now`. The change-event classifier uses this to turn a rewritten
/// achievements.json into the set of achievements that just fired.
pub fn recent_unlocks_from_json(content: &str, now: i64, window: i64) -> Vec<String> {
    parse_json_content(content, now)
        .into_iter()
        .filter(|t| (now - t.unlocked_at).abs() <= window)
        .map(|t| t.key)
        .collect()
}
