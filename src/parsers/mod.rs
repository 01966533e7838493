use crate::registry::SharedRegistry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub mod ali213;
pub mod bracket;
pub mod codex;
pub mod goldberg;
pub mod onlinefix;
pub mod rune;
pub mod tenoke;

/// Parser output: one unlocked achievement, epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockTuple {
    pub key: String,
    pub unlocked_at: i64,
}

/// Everything a format parser needs to locate its files: the game's
/// executable path plus the OS roots the crack layers write under.
#[derive(Clone)]
pub struct ParserContext {
    pub app_id: u32,
    pub exe_path: PathBuf,
    pub public_dir: PathBuf,
    pub app_data_dir: PathBuf,
    pub registry: SharedRegistry,
}

impl ParserContext {
    pub fn new(
        app_id: u32,
        exe_path: PathBuf,
        public_dir: Option<String>,
        app_data_dir: Option<String>,
        registry: SharedRegistry,
    ) -> Self {
        let public_dir = public_dir
            .map(PathBuf::from)
            .or_else(dirs::public_dir)
            .unwrap_or_else(|| PathBuf::from(r"C:\Users\Public"));
        let app_data_dir = app_data_dir
            .map(PathBuf::from)
            .or_else(dirs::data_dir)
            .unwrap_or_default();

        Self {
            app_id,
            exe_path,
            public_dir,
            app_data_dir,
            registry,
        }
    }

    /// `<publicDocs>` root the Steam/RUNE, Steam/CODEX and OnlineFix layouts
    /// live under.
    pub fn public_documents(&self) -> PathBuf {
        self.public_dir.join("Documents")
    }

    /// Registers a located file with the tracked-file registry. Registry
    /// write failures must not fail the parse.
    pub fn track(&self, path: &Path) {
        let path_str = path.to_string_lossy().to_string();
        if let Err(e) = self.registry.add(self.app_id, &path_str) {
            println!("  ⚠ Failed to track {}: {}", path_str, e);
        }
    }
}

/// Reads a candidate file, treating every I/O failure as "not found here".
pub fn read_candidate(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// The supported crack/emulator layouts, in the fixed priority order the
/// reconciliation pass applies them. Later parsers cannot undo unlocks from
/// earlier ones, so the order must stay deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Ali213,
    Rune,
    Codex,
    OnlineFix,
    Tenoke,
    Goldberg,
}

impl ParserKind {
    pub const ALL: [ParserKind; 6] = [
        ParserKind::Ali213,
        ParserKind::Rune,
        ParserKind::Codex,
        ParserKind::OnlineFix,
        ParserKind::Tenoke,
        ParserKind::Goldberg,
    ];
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserKind::Ali213 => write!(f, "ALI213"),
            ParserKind::Rune => write!(f, "RUNE"),
            ParserKind::Codex => write!(f, "CODEX"),
            ParserKind::OnlineFix => write!(f, "Online-fix"),
            ParserKind::Tenoke => write!(f, "TENOKE"),
            ParserKind::Goldberg => write!(f, "Goldberg"),
        }
    }
}

/// Runs one format parser. `None` means "this layout is not present" - never
/// an error; a misbehaving format must not block the others.
pub fn parse(kind: ParserKind, ctx: &ParserContext) -> Option<Vec<UnlockTuple>> {
    match kind {
        ParserKind::Ali213 => ali213::parse(ctx),
        ParserKind::Rune => rune::parse(ctx),
        ParserKind::Codex => codex::parse(ctx),
        ParserKind::OnlineFix => onlinefix::parse(ctx),
        ParserKind::Tenoke => tenoke::parse(ctx),
        ParserKind::Goldberg => goldberg::parse(ctx),
    }
}

/// Merges tuples from multiple physical files of one format, keeping the
/// greater timestamp when the same key appears more than once.
pub fn merge_by_key(tuples: Vec<UnlockTuple>) -> Vec<UnlockTuple> {
    let mut merged: HashMap<String, i64> = HashMap::new();
    for tuple in tuples {
        let entry = merged.entry(tuple.key).or_insert(tuple.unlocked_at);
        if tuple.unlocked_at > *entry {
            *entry = tuple.unlocked_at;
        }
    }

    let mut result: Vec<UnlockTuple> = merged
        .into_iter()
        .map(|(key, unlocked_at)| UnlockTuple { key, unlocked_at })
        .collect();
    result.sort_by(|a, b| a.key.cmp(&b.key));
    result
}
