use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Crack layers bury the real Steam app id in their own config files. These
/// helpers probe the known spots so the add-game flow can resolve an id from
/// nothing but an executable path.

const MAX_SEARCH_DEPTH: usize = 10;

/// Depth-bounded recursive search for a file name (case-sensitive unless the
/// caller lowercases). Returns the first match, files before subdirectories.
pub fn find_file_recursive(dir: &Path, file_name: &str, depth: usize) -> Option<PathBuf> {
    if depth >= MAX_SEARCH_DEPTH {
        return None;
    }

    let entries: Vec<_> = fs::read_dir(dir).ok()?.filter_map(|e| e.ok()).collect();

    for entry in &entries {
        let path = entry.path();
        if path.is_file()
            && entry
                .file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case(file_name)
        {
            return Some(path);
        }
    }

    for entry in &entries {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_recursive(&path, file_name, depth + 1) {
                return Some(found);
            }
        }
    }

    None
}

/// Game directory for an executable path: the exe's parent, or the path
/// itself when it is already a directory.
pub fn game_dir(exe_path: &Path) -> PathBuf {
    if exe_path.is_dir() {
        exe_path.to_path_buf()
    } else {
        exe_path.parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

fn extract_with_pattern(content: &str, pattern: &Regex) -> Option<u32> {
    pattern
        .captures(content)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn probe_ini_files(dir: &Path, file_names: &[&str], pattern: &Regex) -> Option<u32> {
    // Direct lookup first, recursive search only as a fallback.
    for name in file_names {
        if let Ok(content) = fs::read_to_string(dir.join(name)) {
            if let Some(app_id) = extract_with_pattern(&content, pattern) {
                return Some(app_id);
            }
        }
    }

    for name in file_names {
        if let Some(found) = find_file_recursive(dir, name, 0) {
            if let Ok(content) = fs::read_to_string(found) {
                if let Some(app_id) = extract_with_pattern(&content, pattern) {
                    return Some(app_id);
                }
            }
        }
    }

    None
}

/// `AppId = <digits>` out of steam_emu.ini / valve.ini / SteamConfig.ini.
pub fn from_steam_emu_ini(dir: &Path) -> Option<u32> {
    let pattern = Regex::new(r"(?i)AppId\s*=\s*(\d+)").ok()?;
    probe_ini_files(dir, &["steam_emu.ini", "valve.ini", "SteamConfig.ini"], &pattern)
}

/// `RealAppId = <digits>` out of OnlineFix.ini.
pub fn from_onlinefix_ini(dir: &Path) -> Option<u32> {
    let pattern = Regex::new(r"(?i)RealAppId\s*=\s*(\d+)").ok()?;
    probe_ini_files(dir, &["OnlineFix.ini"], &pattern)
}

/// Goldberg's `steam_settings/steam_appid.txt` next to the executable.
pub fn from_steam_appid_txt(exe_path: &Path) -> Option<u32> {
    let appid_path = game_dir(exe_path)
        .join("steam_settings")
        .join("steam_appid.txt");
    let content = fs::read_to_string(appid_path).ok()?;
    content.trim().parse().ok()
}

/// `id = <digits>` inside the `[TENOKE]` section of TENOKE.ini. Comment lines
/// start with `#`; an inline comment may follow the value.
pub fn from_tenoke_ini(dir: &Path) -> Option<u32> {
    let path = find_file_recursive(dir, "tenoke.ini", 0)?;
    let content = fs::read_to_string(path).ok()?;
    parse_tenoke_id(&content)
}

fn parse_tenoke_id(content: &str) -> Option<u32> {
    let id_regex = Regex::new(r"(?i)^id\s*=\s*(\d+)").ok()?;
    let mut in_tenoke_section = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.eq_ignore_ascii_case("[tenoke]") {
            in_tenoke_section = true;
            continue;
        }
        if in_tenoke_section && trimmed.starts_with('[') && trimmed.ends_with(']') {
            break;
        }
        if in_tenoke_section && !trimmed.starts_with('#') {
            if let Some(id) = extract_with_pattern(trimmed, &id_regex) {
                return Some(id);
            }
        }
    }

    None
}

/// Tries every known extraction source in order of reliability.
pub fn resolve_app_id(exe_path: &Path) -> Option<u32> {
    let dir = game_dir(exe_path);

    from_steam_appid_txt(exe_path)
        .or_else(|| from_steam_emu_ini(&dir))
        .or_else(|| from_onlinefix_ini(&dir))
        .or_else(|| from_tenoke_ini(&dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_app_id_from_steam_emu_ini() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("steam_emu.ini"),
            "[Settings]\nAppId = 1091500\nLanguage=english\n",
        )
        .unwrap();

        assert_eq!(from_steam_emu_ini(dir.path()), Some(1091500));
    }

    #[test]
    fn finds_ini_in_nested_subdirectory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("bin").join("win64");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("valve.ini"), "AppId=620\n").unwrap();

        assert_eq!(from_steam_emu_ini(dir.path()), Some(620));
    }

    #[test]
    fn reads_real_app_id_from_onlinefix_ini() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("OnlineFix.ini"),
            "[Main]\nRealAppId=1245620\nFakeAppId=480\n",
        )
        .unwrap();

        assert_eq!(from_onlinefix_ini(dir.path()), Some(1245620));
    }

    #[test]
    fn reads_goldberg_steam_appid_txt() {
        let dir = TempDir::new().unwrap();
        let settings = dir.path().join("steam_settings");
        fs::create_dir_all(&settings).unwrap();
        fs::write(settings.join("steam_appid.txt"), "2062430\n").unwrap();

        let exe = dir.path().join("game.exe");
        fs::write(&exe, "").unwrap();
        assert_eq!(from_steam_appid_txt(&exe), Some(2062430));
    }

    #[test]
    fn tenoke_id_only_read_inside_tenoke_section() {
        let content = "[OTHER]\nid = 111\n[TENOKE]\n# appid\nid = 2062430 # BALL x PIT\n";
        assert_eq!(parse_tenoke_id(content), Some(2062430));

        let no_section = "id = 111\n";
        assert_eq!(parse_tenoke_id(no_section), None);
    }

    #[test]
    fn tenoke_section_ends_at_next_bracket() {
        let content = "[TENOKE]\nname = x\n[EXTRA]\nid = 999\n";
        assert_eq!(parse_tenoke_id(content), None);
    }

    #[test]
    fn missing_files_resolve_to_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(from_steam_emu_ini(dir.path()), None);
        assert_eq!(from_onlinefix_ini(dir.path()), None);
    }
}
