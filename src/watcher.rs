use crate::classifier::{ChangeKind, FileChangeEvent};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Watches the tracked achievement files and turns raw filesystem events
/// into `FileChangeEvent`s carrying the new content plus a positional diff
/// of added lines. Content comparison is done here so duplicate events for
/// an unchanged file never reach the classifier.
pub struct FileWatcher {
    watcher: Mutex<RecommendedWatcher>,
    watched: Mutex<Vec<String>>,
    snapshots: Arc<Mutex<HashMap<String, String>>>,
}

impl FileWatcher {
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<FileChangeEvent>), String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let snapshots: Arc<Mutex<HashMap<String, String>>> = Arc::new(Mutex::new(HashMap::new()));
        let cb_snapshots = Arc::clone(&snapshots);

        // Polling with content comparison catches content-only rewrites that
        // some emulators do without touching the mtime.
        let config = Config::default()
            .with_compare_contents(true)
            .with_poll_interval(Duration::from_secs(2));

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let kind = match event.kind {
                        EventKind::Create(_) => ChangeKind::Created,
                        EventKind::Modify(_) => ChangeKind::Modified,
                        _ => return,
                    };
                    let Some(path) = event.paths.first() else {
                        return;
                    };
                    let path_str = path.to_string_lossy().to_string();

                    let new_content = read_lossy(path);
                    if new_content.is_empty() {
                        return;
                    }

                    let old_content = {
                        let mut snaps = cb_snapshots.lock().unwrap();
                        let old = snaps.get(&path_str).cloned().unwrap_or_default();
                        if old == new_content {
                            return;
                        }
                        snaps.insert(path_str.clone(), new_content.clone());
                        old
                    };

                    let added_lines = get_added_lines(&old_content, &new_content);
                    println!(
                        "  📝 File changed: {} (+{} line(s))",
                        path_str,
                        added_lines.len()
                    );

                    let _ = tx.send(FileChangeEvent {
                        path: path_str,
                        kind,
                        added_lines,
                        content: new_content,
                    });
                }
                Err(e) => eprintln!("  ✗ Watch error: {}", e),
            },
            config,
        )
        .map_err(|e| format!("Failed to create file watcher: {}", e))?;

        Ok((
            Self {
                watcher: Mutex::new(watcher),
                watched: Mutex::new(Vec::new()),
                snapshots,
            },
            rx,
        ))
    }

    /// Arms the watcher over `paths`, replacing whatever was watched before.
    /// Missing files are skipped with a warning; each armed file gets an
    /// initial content snapshot for diffing.
    pub fn watch(&self, paths: &[String]) {
        let mut watcher = self.watcher.lock().unwrap();
        let mut watched = self.watched.lock().unwrap();
        let mut snapshots = self.snapshots.lock().unwrap();

        for old in watched.drain(..) {
            let _ = watcher.unwatch(Path::new(&old));
        }
        snapshots.clear();

        for p in paths {
            let path = Path::new(p);
            if !path.is_file() {
                println!("  ⚠ Path does not exist, skipping: {}", p);
                continue;
            }
            match watcher.watch(path, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    snapshots.insert(p.clone(), read_lossy(path));
                    watched.push(p.clone());
                    println!("  ✓ Watching: {}", p);
                }
                Err(e) => println!("  ✗ Failed to watch {}: {}", p, e),
            }
        }
    }
}

/// Achievement files are usually text, but ALI213's `.bin` may carry stray
/// bytes; lossy conversion keeps the line scan usable either way.
fn read_lossy(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => fs::read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
            .unwrap_or_default(),
    }
}

/// Positional diff: lines in the new content that are not present in the old
/// content. A line that merely moved is not "added".
pub fn get_added_lines(old_content: &str, new_content: &str) -> Vec<String> {
    let old_lines: Vec<&str> = old_content.lines().collect();
    let new_lines: Vec<&str> = new_content.lines().collect();

    let mut added = Vec::new();
    for (i, new_line) in new_lines.iter().enumerate() {
        if i >= old_lines.len() {
            added.push(new_line.to_string());
        } else if old_lines[i] != *new_line && !old_lines.contains(new_line) {
            added.push(new_line.to_string());
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_appended_at_end_are_added() {
        let old = "[ACH_A]\nAchieved=1\n";
        let new = "[ACH_A]\nAchieved=1\n[ACH_B]\nAchieved=1\nUnlockTime=42\n";

        assert_eq!(
            get_added_lines(old, new),
            vec!["[ACH_B]", "Achieved=1", "UnlockTime=42"]
        );
    }

    #[test]
    fn replaced_line_counts_as_added() {
        let old = "[ACH_A]\nAchieved=0\n";
        let new = "[ACH_A]\nAchieved=1\n";

        assert_eq!(get_added_lines(old, new), vec!["Achieved=1"]);
    }

    #[test]
    fn moved_lines_are_not_added() {
        let old = "[ACH_A]\nAchieved=1\n[ACH_B]\nAchieved=1\n";
        let new = "[ACH_B]\nAchieved=1\n[ACH_A]\nAchieved=1\n";

        assert!(get_added_lines(old, new).is_empty());
    }

    #[test]
    fn empty_old_content_reports_everything() {
        let new = "[ACH_A]\nAchieved=1\n";
        assert_eq!(get_added_lines("", new), vec!["[ACH_A]", "Achieved=1"]);
    }

    #[test]
    fn identical_content_reports_nothing() {
        let content = "[ACH_A]\nAchieved=1\n";
        assert!(get_added_lines(content, content).is_empty());
    }
}
