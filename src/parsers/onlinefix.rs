use super::bracket::BracketFormat;
use super::{read_candidate, ParserContext, UnlockTuple};
use chrono::Utc;

/// OnlineFix roots at `<publicDocs>/OnlineFix/<appid>` and is inconsistent
/// about casing, so every `Stats`/`stats` x `Achievements.ini`/
/// `achievements.ini` combination is probed in a fixed order.
pub fn parse(ctx: &ParserContext) -> Option<Vec<UnlockTuple>> {
    let base = ctx
        .public_documents()
        .join("OnlineFix")
        .join(ctx.app_id.to_string());

    let candidates = [
        base.join("Stats").join("Achievements.ini"),
        base.join("stats").join("Achievements.ini"),
        base.join("Stats").join("achievements.ini"),
        base.join("stats").join("achievements.ini"),
    ];

    for path in &candidates {
        if let Some(content) = read_candidate(path) {
            ctx.track(path);
            return Some(parse_content(&content, Utc::now().timestamp()));
        }
    }

    None
}

pub fn parse_content(content: &str, now: i64) -> Vec<UnlockTuple> {
    BracketFormat::onlinefix().scan(content, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_support::context_in;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn probes_lowercase_variant() {
        let dir = TempDir::new().unwrap();
        let stats = dir
            .path()
            .join("Public")
            .join("Documents")
            .join("OnlineFix")
            .join("990")
            .join("stats");
        fs::create_dir_all(&stats).unwrap();
        fs::write(
            stats.join("achievements.ini"),
            "[ACH_FIRST]\nachieved=true\ntimestamp=1670000000\n",
        )
        .unwrap();

        let ctx = context_in(990, dir.path(), &dir.path().join("game.exe"));
        let tuples = parse(&ctx).unwrap();

        assert_eq!(
            tuples,
            vec![UnlockTuple { key: "ACH_FIRST".into(), unlocked_at: 1_670_000_000 }]
        );
    }

    #[test]
    fn missing_timestamp_uses_current_time() {
        let tuples = parse_content("[ACH_X]\nachieved=true\n", 1_700_000_000);
        assert_eq!(tuples[0].unlocked_at, 1_700_000_000);
    }
}
