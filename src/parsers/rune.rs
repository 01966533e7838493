use super::bracket::BracketFormat;
use super::{read_candidate, ParserContext, UnlockTuple};
use chrono::Utc;

/// RUNE writes `<publicDocs>/Steam/RUNE/<appid>/achievements.ini` in the
/// bracket-section `Achieved=1` layout.
pub fn parse(ctx: &ParserContext) -> Option<Vec<UnlockTuple>> {
    let path = ctx
        .public_documents()
        .join("Steam")
        .join("RUNE")
        .join(ctx.app_id.to_string())
        .join("achievements.ini");

    let content = read_candidate(&path)?;
    ctx.track(&path);

    Some(parse_content(&content, Utc::now().timestamp()))
}

pub fn parse_content(content: &str, now: i64) -> Vec<UnlockTuple> {
    BracketFormat::codex_rune().scan(content, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_support::context_in;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_and_tracks_rune_file() {
        let dir = TempDir::new().unwrap();
        let rune_dir = dir
            .path()
            .join("Public")
            .join("Documents")
            .join("Steam")
            .join("RUNE")
            .join("730");
        fs::create_dir_all(&rune_dir).unwrap();
        let ini = rune_dir.join("achievements.ini");
        fs::write(&ini, "[ACH_WIN]\nAchieved=1\nUnlockTime=1690000000\n").unwrap();

        let ctx = context_in(730, dir.path(), &dir.path().join("game.exe"));
        let tuples = parse(&ctx).unwrap();

        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].key, "ACH_WIN");
        assert_eq!(
            ctx.registry.app_for_path(&ini.to_string_lossy()),
            Some(730)
        );
    }

    #[test]
    fn absent_layout_returns_none() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(730, dir.path(), &dir.path().join("game.exe"));
        assert!(parse(&ctx).is_none());
    }
}
