use super::UnlockTuple;
use regex::Regex;

/// Sections that are layout metadata, never achievements. Compared
/// case-insensitively against the bracket name.
const METADATA_SECTIONS: [&str; 4] = ["steamachievements", "steam64", "steam", "achieve_data"];

/// Pattern set for one bracket-section layout: `[Name]` followed by an
/// achieved marker and an optional unlock-time field somewhere in the same
/// section. These files have no real grammar; line scanning per section is
/// all there is.
pub struct BracketFormat {
    section: Regex,
    achieved: Regex,
    unlock_time: Regex,
}

impl BracketFormat {
    fn new(achieved: &str, unlock_time: &str) -> Self {
        Self {
            section: Regex::new(r"(?m)^\[([^\]\n]+)\]").unwrap(),
            achieved: Regex::new(achieved).unwrap(),
            unlock_time: Regex::new(unlock_time).unwrap(),
        }
    }

    /// CODEX and RUNE: `Achieved=1` + `UnlockTime=<epoch>`.
    pub fn codex_rune() -> Self {
        Self::new(r"(?mi)^Achieved\s*=\s*1", r"(?mi)^UnlockTime\s*=\s*(\d+)")
    }

    /// ALI213 achievements.bin: `HaveAchieved=1` + `HaveAchievedTime=<epoch>`.
    pub fn ali213() -> Self {
        Self::new(
            r"(?mi)^HaveAchieved\s*=\s*1",
            r"(?mi)^HaveAchievedTime\s*=\s*(\d+)",
        )
    }

    /// OnlineFix: `achieved=true` + `timestamp=<epoch>`.
    pub fn onlinefix() -> Self {
        Self::new(
            r"(?mi)^achieved\s*=\s*true",
            r"(?mi)^timestamp\s*=\s*(\d+)",
        )
    }

    /// Goldberg INI variants cover several field spellings.
    pub fn goldberg_ini() -> Self {
        Self::new(
            r"(?mi)^(?:Achieved|unlocked|State)\s*=\s*(?:1|true)",
            r"(?mi)^(?:UnlockTime|unlocktime|unlock_time|Time)\s*=\s*(\d+)",
        )
    }

    /// Extracts unlock tuples from raw file content. An achieved section
    /// without an unlock-time field is stamped with `now` - the producers
    /// that omit the field write it at the moment of unlock.
    pub fn scan(&self, content: &str, now: i64) -> Vec<UnlockTuple> {
        let mut tuples = Vec::new();

        for cap in self.section.captures_iter(content) {
            let section_match = cap.get(0).unwrap();
            let section_name = cap.get(1).unwrap().as_str();

            if is_metadata_section(section_name) {
                continue;
            }

            // Section body runs until the next bracket line or end of file.
            let body_start = section_match.end();
            let body_end = content[body_start..]
                .find("\n[")
                .map(|pos| body_start + pos)
                .unwrap_or(content.len());
            let body = &content[body_start..body_end];

            if !self.achieved.is_match(body) {
                continue;
            }

            let unlocked_at = self
                .unlock_time
                .captures(body)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .filter(|&t| t > 0)
                .unwrap_or(now);

            tuples.push(UnlockTuple {
                key: section_name.trim().to_string(),
                unlocked_at,
            });
        }

        tuples
    }
}

pub fn is_metadata_section(name: &str) -> bool {
    METADATA_SECTIONS
        .iter()
        .any(|m| name.eq_ignore_ascii_case(m))
}

/// Bracket tokens on a single line - the classifier scans appended lines
/// with this to spot a freshly written section header.
pub fn section_names_in_line(line: &str) -> Vec<String> {
    let section = Regex::new(r"\[([^\]\n]+)\]").unwrap();
    section
        .captures_iter(line)
        .map(|c| c.get(1).unwrap().as_str().trim().to_string())
        .filter(|name| !is_metadata_section(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn codex_rune_sections_with_unlock_time() {
        let content = "[ACH_Y]\nAchieved=1\nUnlockTime=1690000000\n\n[ACH_LOCKED]\nAchieved=0\n";
        let tuples = BracketFormat::codex_rune().scan(content, NOW);

        assert_eq!(
            tuples,
            vec![UnlockTuple { key: "ACH_Y".into(), unlocked_at: 1_690_000_000 }]
        );
    }

    #[test]
    fn missing_unlock_time_defaults_to_now() {
        let content = "[ACH_A]\nAchieved=1\n";
        let tuples = BracketFormat::codex_rune().scan(content, NOW);
        assert_eq!(tuples[0].unlocked_at, NOW);
    }

    #[test]
    fn steam_achievements_section_never_emitted() {
        for name in ["SteamAchievements", "steamachievements", "STEAMACHIEVEMENTS"] {
            let content = format!("[{}]\nAchieved=1\nUnlockTime=123\n", name);
            assert!(BracketFormat::codex_rune().scan(&content, NOW).is_empty());
        }
    }

    #[test]
    fn ali213_field_names() {
        let content = "[FIRST_BLOOD]\nHaveAchieved=1\nHaveAchievedTime=1650000000\n";
        let tuples = BracketFormat::ali213().scan(content, NOW);
        assert_eq!(
            tuples,
            vec![UnlockTuple { key: "FIRST_BLOOD".into(), unlocked_at: 1_650_000_000 }]
        );
    }

    #[test]
    fn onlinefix_true_flag_and_timestamp() {
        let content = "[WIN_RACE]\nachieved = true\ntimestamp = 1660000000\n\n[LOSE]\nachieved = false\ntimestamp = 1660000001\n";
        let tuples = BracketFormat::onlinefix().scan(content, NOW);
        assert_eq!(
            tuples,
            vec![UnlockTuple { key: "WIN_RACE".into(), unlocked_at: 1_660_000_000 }]
        );
    }

    #[test]
    fn time_field_from_neighbor_section_not_borrowed() {
        // ACH_A is achieved but has no time; ACH_B's time must not leak in.
        let content = "[ACH_A]\nAchieved=1\n[ACH_B]\nAchieved=1\nUnlockTime=42\n";
        let tuples = BracketFormat::codex_rune().scan(content, NOW);

        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0].unlocked_at, NOW);
        assert_eq!(tuples[1].unlocked_at, 42);
    }

    #[test]
    fn zero_unlock_time_treated_as_missing() {
        let content = "[ACH_A]\nAchieved=1\nUnlockTime=0\n";
        let tuples = BracketFormat::codex_rune().scan(content, NOW);
        assert_eq!(tuples[0].unlocked_at, NOW);
    }

    #[test]
    fn line_token_scan_skips_metadata() {
        assert_eq!(
            section_names_in_line("[ACH_ONE] text [SteamAchievements] [ACH_TWO]"),
            vec!["ACH_ONE".to_string(), "ACH_TWO".to_string()]
        );
        assert!(section_names_in_line("no brackets here").is_empty());
    }
}
