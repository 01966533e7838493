use super::bracket::BracketFormat;
use super::{read_candidate, ParserContext, UnlockTuple};
use crate::appid::{find_file_recursive, game_dir};
use chrono::Utc;

/// ALI213 (valve-ini style) keeps `achievements.bin` somewhere under the game
/// directory - location varies per release, so the search is a depth-bounded
/// recursive walk from the executable's directory.
pub fn parse(ctx: &ParserContext) -> Option<Vec<UnlockTuple>> {
    let root = game_dir(&ctx.exe_path);
    if !root.is_dir() {
        return None;
    }

    let path = find_file_recursive(&root, "achievements.bin", 0)?;
    let content = read_candidate(&path)?;
    ctx.track(&path);

    Some(parse_content(&content, Utc::now().timestamp()))
}

pub fn parse_content(content: &str, now: i64) -> Vec<UnlockTuple> {
    BracketFormat::ali213().scan(content, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_support::context_in;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_bin_in_profile_subdirectory() {
        let dir = TempDir::new().unwrap();
        let game = dir.path().join("game");
        let profile = game.join("Profile").join("ALI213");
        fs::create_dir_all(&profile).unwrap();
        fs::write(
            profile.join("achievements.bin"),
            "[ACH_BOSS]\nHaveAchieved=1\nHaveAchievedTime=1655000000\n",
        )
        .unwrap();
        let exe = game.join("game.exe");
        fs::write(&exe, "").unwrap();

        let ctx = context_in(400, dir.path(), &exe);
        let tuples = parse(&ctx).unwrap();

        assert_eq!(
            tuples,
            vec![UnlockTuple { key: "ACH_BOSS".into(), unlocked_at: 1_655_000_000 }]
        );
    }

    #[test]
    fn no_bin_anywhere_returns_none() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("game.exe");
        fs::write(&exe, "").unwrap();

        let ctx = context_in(400, dir.path(), &exe);
        assert!(parse(&ctx).is_none());
    }
}
