use super::{read_candidate, ParserContext, UnlockTuple};
use crate::appid::game_dir;
use regex::Regex;

/// TENOKE writes `<gameDir>/SteamData/user_stats.ini` with one dict-style
/// line per achievement inside an `[ACHIEVEMENTS]` section:
///
///   "ACH_FIRST_WIN" = {unlocked = true, time = 1761878592}
///
/// Only entries carrying both `unlocked = true` and a positive `time` count.
pub fn parse(ctx: &ParserContext) -> Option<Vec<UnlockTuple>> {
    let path = game_dir(&ctx.exe_path)
        .join("SteamData")
        .join("user_stats.ini");

    let content = read_candidate(&path)?;
    ctx.track(&path);

    Some(parse_content(&content))
}

pub fn parse_content(content: &str) -> Vec<UnlockTuple> {
    let mut tuples = Vec::new();
    let mut in_achievements = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.eq_ignore_ascii_case("[achievements]") {
            in_achievements = true;
            continue;
        }
        if in_achievements && trimmed.starts_with('[') && trimmed.ends_with(']') {
            break;
        }
        if !in_achievements || trimmed.starts_with('#') || !trimmed.contains('=') {
            continue;
        }

        if let Some(tuple) = parse_dict_line(trimmed) {
            tuples.push(tuple);
        }
    }

    tuples
}

/// One `"name" = { ... }` line. Also used by the change-event classifier on
/// appended lines, where the section context is unavailable.
pub fn parse_dict_line(line: &str) -> Option<UnlockTuple> {
    let entry = Regex::new(r#"^"?([^"=]+)"?\s*=\s*\{([^}]+)\}"#).unwrap();
    let unlocked = Regex::new(r"(?i)unlocked\s*=\s*true").unwrap();
    let time = Regex::new(r"time\s*=\s*(\d+)").unwrap();

    let cap = entry.captures(line.trim())?;
    let name = cap.get(1)?.as_str().trim();
    let body = cap.get(2)?.as_str();

    if !unlocked.is_match(body) {
        return None;
    }

    let unlocked_at: i64 = time.captures(body)?.get(1)?.as_str().parse().ok()?;
    if unlocked_at <= 0 {
        return None;
    }

    Some(UnlockTuple {
        key: name.to_string(),
        unlocked_at,
    })
}
