use crate::records::{AchievementDefinition, AchievementEntry, AchievementState, GameAchievementRecord};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    game: Option<GameSchemaRaw>,
}

#[derive(Debug, Deserialize)]
struct GameSchemaRaw {
    #[serde(rename = "gameName")]
    game_name: Option<String>,
    #[serde(rename = "gameVersion")]
    game_version: Option<String>,
    #[serde(rename = "availableGameStats")]
    available_game_stats: Option<AvailableGameStats>,
}

#[derive(Debug, Deserialize)]
struct AvailableGameStats {
    achievements: Option<Vec<SchemaAchievement>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchemaAchievement {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "icongray")]
    pub icon_gray: Option<String>,
    pub hidden: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct GameSchema {
    pub game_name: String,
    pub game_version: String,
    pub achievements: Vec<SchemaAchievement>,
}

#[derive(Debug, Deserialize)]
struct GlobalPercentagesResponse {
    achievementpercentages: Option<GlobalPercentagesData>,
}

#[derive(Debug, Deserialize)]
struct GlobalPercentagesData {
    achievements: Option<Vec<GlobalAchievementPercentage>>,
}

/// Steam serves `percent` as a JSON string on this endpoint, but a number
/// has been observed too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PercentValue {
    Num(f32),
    Text(String),
}

impl PercentValue {
    fn as_f32(&self) -> Option<f32> {
        match self {
            PercentValue::Num(n) => Some(*n),
            PercentValue::Text(s) => s.parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlobalAchievementPercentage {
    name: String,
    percent: PercentValue,
}

/// Steam Web API client for achievement schemas and global unlock rarity.
pub struct SteamAchievementClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
}

impl SteamAchievementClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Fetches the achievement schema for a game (GetSchemaForGame v2).
    /// Requires a configured API key.
    pub async fn get_achievement_schema(&self, app_id: u32) -> Result<GameSchema, String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            "Steam API key not configured. Please set your API key in Settings.".to_string()
        })?;

        let url = format!(
            "https://api.steampowered.com/ISteamUserStats/GetSchemaForGame/v2/?key={}&appid={}",
            api_key, app_id
        );

        println!("  Fetching achievement schema for app_id: {}", app_id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch from Steam API: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Steam API returned error: {}", response.status()));
        }

        let api_response: SchemaResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Steam API response: {}", e))?;

        let game = api_response
            .game
            .ok_or_else(|| "No schema found for this game".to_string())?;
        let achievements = game
            .available_game_stats
            .and_then(|s| s.achievements)
            .ok_or_else(|| "No achievements found for this game".to_string())?;

        Ok(GameSchema {
            game_name: game.game_name.unwrap_or_default(),
            game_version: game.game_version.unwrap_or_default(),
            achievements,
        })
    }

    /// Global unlock percentages (GetGlobalAchievementPercentagesForApp v2).
    /// No API key needed; this endpoint is keyed by `gameid`.
    pub async fn get_global_achievement_percentages(
        &self,
        app_id: u32,
    ) -> Result<HashMap<String, f32>, String> {
        let url = format!(
            "https://api.steampowered.com/ISteamUserStats/GetGlobalAchievementPercentagesForApp/v2/?gameid={}",
            app_id
        );

        println!("  Fetching global achievement percentages for app_id: {}", app_id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch global percentages: {}", e))?;

        let percentages_response: GlobalPercentagesResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse global percentages: {}", e))?;

        let mut result = HashMap::new();
        if let Some(achievements) = percentages_response
            .achievementpercentages
            .and_then(|d| d.achievements)
        {
            for ach in achievements {
                if let Some(percent) = ach.percent.as_f32() {
                    result.insert(ach.name, percent);
                }
            }
            println!("  ✓ Loaded global percentages for {} achievements", result.len());
        }

        Ok(result)
    }

    /// Add-game flow: schema + rarity assembled into a fresh all-locked
    /// record. Missing percentages are tolerated; a missing schema is not.
    pub async fn build_record(&self, app_id: u32) -> Result<GameAchievementRecord, String> {
        let schema = self.get_achievement_schema(app_id).await?;

        let percentages = match self.get_global_achievement_percentages(app_id).await {
            Ok(p) => p,
            Err(e) => {
                println!("  ⚠ Global percentages unavailable: {}", e);
                HashMap::new()
            }
        };

        Ok(assemble_record(app_id, schema, &percentages))
    }
}

fn assemble_record(
    app_id: u32,
    schema: GameSchema,
    percentages: &HashMap<String, f32>,
) -> GameAchievementRecord {
    let achievements = schema
        .achievements
        .into_iter()
        .map(|a| AchievementEntry {
            state: AchievementState::default(),
            definition: AchievementDefinition {
                global_unlock_percent: percentages.get(&a.name).copied(),
                key: a.name,
                display_name: a.display_name,
                description: a.description.unwrap_or_default(),
                is_secret: a.hidden.unwrap_or(0) == 1,
                icon_unlocked: a.icon,
                icon_locked: a.icon_gray,
            },
        })
        .collect();

    GameAchievementRecord {
        game_id: app_id,
        game_name: schema.game_name,
        game_version: schema.game_version,
        achievements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_coerced_from_string_or_number() {
        let from_string: GlobalAchievementPercentage =
            serde_json::from_str(r#"{"name": "ACH_A", "percent": "52.3"}"#).unwrap();
        assert_eq!(from_string.percent.as_f32(), Some(52.3));

        let from_number: GlobalAchievementPercentage =
            serde_json::from_str(r#"{"name": "ACH_B", "percent": 12.5}"#).unwrap();
        assert_eq!(from_number.percent.as_f32(), Some(12.5));

        let garbage: GlobalAchievementPercentage =
            serde_json::from_str(r#"{"name": "ACH_C", "percent": "n/a"}"#).unwrap();
        assert_eq!(garbage.percent.as_f32(), None);
    }

    #[test]
    fn schema_response_shape() {
        let raw = r#"{
            "game": {
                "gameName": "Test Game",
                "gameVersion": "3",
                "availableGameStats": {
                    "achievements": [
                        {"name": "ACH_A", "displayName": "First", "hidden": 1,
                         "description": "Do the thing",
                         "icon": "a.jpg", "icongray": "a_gray.jpg"}
                    ]
                }
            }
        }"#;
        let parsed: SchemaResponse = serde_json::from_str(raw).unwrap();
        let game = parsed.game.unwrap();
        assert_eq!(game.game_name.as_deref(), Some("Test Game"));
        let achs = game.available_game_stats.unwrap().achievements.unwrap();
        assert_eq!(achs[0].name, "ACH_A");
        assert_eq!(achs[0].hidden, Some(1));
    }

    #[test]
    fn assembled_record_starts_all_locked() {
        let schema = GameSchema {
            game_name: "Test Game".to_string(),
            game_version: "3".to_string(),
            achievements: vec![SchemaAchievement {
                name: "ACH_A".to_string(),
                display_name: "First".to_string(),
                description: None,
                icon: Some("a.jpg".to_string()),
                icon_gray: Some("a_gray.jpg".to_string()),
                hidden: Some(1),
            }],
        };
        let percentages = HashMap::from([("ACH_A".to_string(), 7.5_f32)]);

        let record = assemble_record(440, schema, &percentages);

        assert_eq!(record.game_id, 440);
        assert_eq!(record.game_name, "Test Game");
        assert_eq!(record.unlocked_count(), 0);
        let entry = record.entry("ACH_A").unwrap();
        assert!(entry.definition.is_secret);
        assert_eq!(entry.definition.global_unlock_percent, Some(7.5));
        assert_eq!(entry.state.unlocked_at, 0);
    }
}
