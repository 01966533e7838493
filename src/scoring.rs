use crate::records::{AchievementEntry, GameAchievementRecord};
use chrono::NaiveDate;
use serde::Serialize;

/// Pure scoring: a reconciled record plus rarity percentages in, point
/// breakdowns, tiers and ranks out. No I/O, no clock - fully deterministic.
/// Missing data (no rarity, no release date, no genres) degrades to zero
/// bonuses and a 1.0 multiplier, never to an error.

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub base_score: u32,
    pub rarity_bonus: u32,
    pub streak_bonus: u32,
    pub speed_bonus: u32,
    pub completion_bonus: u32,
    pub difficulty_multiplier: f64,
    pub total_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Tier {
    /// Epic and below-epic rarity counts toward the "rare achievements"
    /// profile stat.
    pub fn is_rare(self) -> bool {
        matches!(self, Tier::Epic | Tier::Legendary | Tier::Mythic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameRank {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverallRank {
    Novice,
    Explorer,
    Hunter,
    Master,
    Legend,
    Grandmaster,
    #[serde(rename = "Touch Grass")]
    TouchGrass,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAchievement {
    pub key: String,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub tier: Tier,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameScore {
    pub game_id: u32,
    pub game_name: String,
    pub achievements: Vec<ScoredAchievement>,
    pub total_game_score: u32,
    pub completion_percent: f64,
    pub rank: GameRank,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub total_score: u32,
    pub games_played: usize,
    pub average_completion: f64,
    pub rare_achievements: usize,
    pub perfect_games: usize,
    pub overall_rank: OverallRank,
    pub badges: Vec<String>,
}

/// Store metadata the schema fetch does not carry. Optional end to end.
#[derive(Debug, Clone, Default)]
pub struct GameMeta {
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
}

pub fn tier(percent: f32) -> Tier {
    if percent >= 80.0 {
        Tier::Common
    } else if percent >= 50.0 {
        Tier::Uncommon
    } else if percent >= 25.0 {
        Tier::Rare
    } else if percent >= 10.0 {
        Tier::Epic
    } else if percent >= 3.0 {
        Tier::Legendary
    } else {
        Tier::Mythic
    }
}

/// Step function on the global unlock percentage. Rarer = more points.
pub fn base_score(percent: f32) -> u32 {
    if percent >= 80.0 {
        10
    } else if percent >= 50.0 {
        25
    } else if percent >= 25.0 {
        50
    } else if percent >= 10.0 {
        100
    } else if percent >= 3.0 {
        250
    } else if percent >= 1.0 {
        500
    } else if percent >= 0.5 {
        750
    } else {
        1000
    }
}

pub fn rarity_bonus(percent: f32, is_secret: bool) -> u32 {
    let mut bonus = 0;

    if percent < 1.0 {
        bonus += 200;
    } else if percent < 3.0 {
        bonus += 100;
    } else if percent < 10.0 {
        bonus += 50;
    }

    if is_secret {
        bonus += 50;
    }

    bonus
}

pub fn streak_bonus(consecutive: usize) -> u32 {
    if consecutive >= 10 {
        100
    } else if consecutive >= 5 {
        50
    } else if consecutive >= 3 {
        25
    } else {
        0
    }
}

/// Bonus for unlocking close to the game's release. Either date missing
/// means no bonus.
pub fn speed_bonus(unlocked_at: i64, release_date: Option<NaiveDate>) -> u32 {
    let Some(release) = release_date else {
        return 0;
    };
    if unlocked_at <= 0 {
        return 0;
    }

    let unlock_days = unlocked_at / 86_400;
    let release_days = release
        .signed_duration_since(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
        .num_days();
    let days = (unlock_days - release_days).abs();

    if days <= 7 {
        100
    } else if days <= 30 {
        50
    } else if days <= 90 {
        25
    } else {
        0
    }
}

/// Game-level bonus, added once on top of the per-achievement sum.
pub fn completion_bonus(completion_percent: f64) -> u32 {
    if completion_percent == 100.0 {
        500
    } else if completion_percent >= 90.0 {
        200
    } else if completion_percent >= 75.0 {
        100
    } else if completion_percent >= 50.0 {
        50
    } else {
        0
    }
}

const HARD_GENRES: [&str; 5] = [
    "souls-like",
    "roguelike",
    "bullet hell",
    "hardcore",
    "simulation",
];
const MEDIUM_GENRES: [&str; 4] = ["action", "rpg", "strategy", "platformer"];

const KNOWN_HARD_GAMES: [&str; 12] = [
    "dark souls",
    "sekiro",
    "elden ring",
    "cuphead",
    "hollow knight",
    "celeste",
    "super meat boy",
    "binding of isaac",
    "spelunky",
    "dwarf fortress",
    "getting over it",
    "i wanna be",
];
const KNOWN_MEDIUM_GAMES: [&str; 4] = ["witcher", "assassin", "call of duty", "battlefield"];

/// Three independent difficulty signals - rarity-distribution analysis,
/// genre keywords and known game names - combined by running maximum, never
/// stacked.
pub fn difficulty_multiplier(
    game_name: &str,
    achievements: &[AchievementEntry],
    genres: &[String],
) -> f64 {
    let mut multiplier: f64 = 1.0;

    if !achievements.is_empty() {
        let percent_of = |a: &AchievementEntry| a.definition.global_unlock_percent.unwrap_or(100.0);

        let avg: f32 = achievements.iter().map(percent_of).sum::<f32>() / achievements.len() as f32;
        let ultra_rare = achievements.iter().filter(|a| percent_of(a) < 5.0).count();
        let rare_fraction = ultra_rare as f32 / achievements.len() as f32 * 100.0;

        if avg < 15.0 || rare_fraction > 40.0 {
            multiplier = 1.5;
        } else if avg < 25.0 || rare_fraction > 25.0 {
            multiplier = 1.3;
        } else if avg < 40.0 || rare_fraction > 15.0 {
            multiplier = 1.2;
        }
    }

    let genres_lower: Vec<String> = genres.iter().map(|g| g.to_lowercase()).collect();
    if HARD_GENRES
        .iter()
        .any(|h| genres_lower.iter().any(|g| g.contains(h)))
    {
        multiplier = multiplier.max(1.4);
    } else if MEDIUM_GENRES
        .iter()
        .any(|m| genres_lower.iter().any(|g| g.contains(m)))
    {
        multiplier = multiplier.max(1.1);
    }

    let name_lower = game_name.to_lowercase();
    if KNOWN_HARD_GAMES.iter().any(|g| name_lower.contains(g)) {
        multiplier = multiplier.max(1.4);
    } else if KNOWN_MEDIUM_GAMES.iter().any(|g| name_lower.contains(g)) {
        multiplier = multiplier.max(1.1);
    }

    multiplier
}

fn score_achievement(
    entry: &AchievementEntry,
    consecutive: usize,
    multiplier: f64,
    meta: &GameMeta,
) -> ScoredAchievement {
    let percent = entry.definition.global_unlock_percent.unwrap_or(100.0);

    let base_score = base_score(percent);
    let rarity_bonus = rarity_bonus(percent, entry.definition.is_secret);
    let streak_bonus = streak_bonus(consecutive);
    let speed_bonus = speed_bonus(entry.state.unlocked_at, meta.release_date);

    let subtotal = base_score + rarity_bonus + streak_bonus + speed_bonus;
    let total_score = (subtotal as f64 * multiplier).round() as u32;

    ScoredAchievement {
        key: entry.definition.key.clone(),
        score: total_score,
        breakdown: ScoreBreakdown {
            base_score,
            rarity_bonus,
            streak_bonus,
            speed_bonus,
            // Game-level; always zero in the per-achievement breakdown.
            completion_bonus: 0,
            difficulty_multiplier: multiplier,
            total_score,
        },
        tier: tier(percent),
    }
}

pub fn game_rank(score: u32, completion: f64) -> GameRank {
    if completion == 100.0 && score >= 5000 {
        GameRank::Master
    } else if completion >= 90.0 && score >= 3000 {
        GameRank::Diamond
    } else if completion >= 75.0 && score >= 2000 {
        GameRank::Platinum
    } else if completion >= 50.0 && score >= 1000 {
        GameRank::Gold
    } else if completion >= 25.0 && score >= 500 {
        GameRank::Silver
    } else {
        GameRank::Bronze
    }
}

pub fn overall_rank(score: u32, avg_completion: f64) -> OverallRank {
    if score >= 200_000 && avg_completion >= 98.0 {
        OverallRank::TouchGrass
    } else if score >= 50_000 && avg_completion >= 90.0 {
        OverallRank::Grandmaster
    } else if score >= 25_000 && avg_completion >= 75.0 {
        OverallRank::Legend
    } else if score >= 10_000 && avg_completion >= 60.0 {
        OverallRank::Master
    } else if score >= 5_000 && avg_completion >= 40.0 {
        OverallRank::Hunter
    } else if score >= 1_000 && avg_completion >= 20.0 {
        OverallRank::Explorer
    } else {
        OverallRank::Novice
    }
}

/// Scores every unlocked achievement in a record. The streak counter walks
/// the unlocked list in order and resets on any entry without a valid
/// timestamp.
pub fn score_game(record: &GameAchievementRecord, meta: &GameMeta) -> GameScore {
    let multiplier = difficulty_multiplier(&record.game_name, &record.achievements, &meta.genres);
    let completion = record.completion_percent();

    let mut consecutive = 0;
    let mut scored = Vec::new();
    for entry in record.achievements.iter().filter(|a| a.state.unlocked) {
        if entry.state.unlocked_at > 0 {
            consecutive += 1;
        } else {
            consecutive = 0;
        }
        scored.push(score_achievement(entry, consecutive, multiplier, meta));
    }

    let base_total: u32 = scored.iter().map(|a| a.score).sum();
    let total = base_total + completion_bonus(completion);

    GameScore {
        game_id: record.game_id,
        game_name: record.game_name.clone(),
        achievements: scored,
        total_game_score: total,
        completion_percent: completion,
        rank: game_rank(total, completion),
    }
}

pub fn user_profile(game_scores: &[GameScore]) -> UserProfile {
    let total_score: u32 = game_scores.iter().map(|g| g.total_game_score).sum();
    let average_completion = if game_scores.is_empty() {
        0.0
    } else {
        game_scores.iter().map(|g| g.completion_percent).sum::<f64>() / game_scores.len() as f64
    };
    let rare_achievements = game_scores
        .iter()
        .flat_map(|g| &g.achievements)
        .filter(|a| a.tier.is_rare())
        .count();
    let perfect_games = game_scores
        .iter()
        .filter(|g| g.completion_percent == 100.0)
        .count();

    let mut badges = Vec::new();
    if rare_achievements >= 50 {
        badges.push("🏆 Rare Hunter".to_string());
    }
    if perfect_games >= 10 {
        badges.push("💯 Perfectionist".to_string());
    }
    if game_scores.len() >= 100 {
        badges.push("🎮 Game Collector".to_string());
    }
    if total_score >= 100_000 {
        badges.push("⭐ Score Master".to_string());
    }
    if average_completion >= 95.0 {
        badges.push("🎯 Completionist".to_string());
    }
    if total_score >= 200_000 && average_completion >= 98.0 {
        badges.push("🌱 Touch Grass Master".to_string());
        badges.push("👑 Ultimate Gamer".to_string());
        badges.push("🌍 Go Outside Reminder".to_string());
    }
    if total_score >= 150_000 {
        badges.push("🚀 Score Legend".to_string());
    }
    if rare_achievements >= 100 {
        badges.push("💎 Mythic Collector".to_string());
    }
    if perfect_games >= 25 {
        badges.push("🎖️ Perfect Master".to_string());
    }
    if game_scores.len() >= 200 {
        badges.push("🏛️ Game Library God".to_string());
    }

    UserProfile {
        total_score,
        games_played: game_scores.len(),
        average_completion,
        rare_achievements,
        perfect_games,
        overall_rank: overall_rank(total_score, average_completion),
        badges,
    }
}
