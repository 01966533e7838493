use super::bracket::BracketFormat;
use super::{read_candidate, ParserContext, UnlockTuple};
use chrono::Utc;

/// CODEX uses the same bracket layout as RUNE, rooted at
/// `<publicDocs>/Steam/CODEX/<appid>/achievements.ini`.
pub fn parse(ctx: &ParserContext) -> Option<Vec<UnlockTuple>> {
    let path = ctx
        .public_documents()
        .join("Steam")
        .join("CODEX")
        .join(ctx.app_id.to_string())
        .join("achievements.ini");

    let content = read_candidate(&path)?;
    ctx.track(&path);

    Some(parse_content(&content, Utc::now().timestamp()))
}

pub fn parse_content(content: &str, now: i64) -> Vec<UnlockTuple> {
    BracketFormat::codex_rune().scan(content, now)
}
