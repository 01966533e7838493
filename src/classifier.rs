use crate::config::AppConfig;
use crate::parsers::bracket::section_names_in_line;
use crate::parsers::goldberg::recent_unlocks_from_json;
use crate::parsers::tenoke::parse_dict_line;
use crate::records::GameAchievementRecord;
use std::collections::HashSet;

/// Raw file change delivered by the watcher. `added_lines` is a positional
/// diff against the previous snapshot; `content` is the full new content.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    pub path: String,
    pub kind: ChangeKind,
    pub added_lines: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Processing,
}

/// Turns a file change into the set of achievement keys that just unlocked.
///
/// Emulators rewrite these files constantly while a game runs, so the
/// pipeline is gated twice: `admit` (debounce + re-entrancy) decides whether
/// an event is worth a parser pass at all, and `classify` then runs the
/// detection priority - appended lines, JSON content diff, wide-window sweep
/// of the re-parsed record - filtered through the already-notified set.
pub struct ChangeClassifier {
    state: State,
    last_event_ms: i64,
    notified: HashSet<String>,
    notified_cleared_at: i64,
    debounce_ms: i64,
    direct_window_secs: i64,
    fallback_window_secs: i64,
    notified_ttl_secs: i64,
}

impl ChangeClassifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state: State::Idle,
            last_event_ms: 0,
            notified: HashSet::new(),
            notified_cleared_at: 0,
            debounce_ms: config.classifier_debounce_ms as i64,
            direct_window_secs: config.classifier_direct_window_secs,
            fallback_window_secs: config.classifier_fallback_window_secs,
            notified_ttl_secs: config.notified_ttl_secs as i64,
        }
    }

    /// Pipeline gate. Events within the debounce window of the last admitted
    /// event, or arriving while a pipeline is in flight, are dropped - not
    /// queued. An admitted event moves the classifier to `Processing` until
    /// `finish()` is called.
    pub fn admit(&mut self, event: &FileChangeEvent, now_ms: i64) -> bool {
        if event.kind == ChangeKind::Removed {
            return false;
        }
        if self.state == State::Processing {
            return false;
        }
        if self.last_event_ms > 0 && now_ms - self.last_event_ms < self.debounce_ms {
            return false;
        }
        self.last_event_ms = now_ms;
        self.state = State::Processing;
        true
    }

    /// Detection over an admitted event. `record` is the canonical record
    /// after a fresh parser pass; `now_ms` is epoch milliseconds. Keys the
    /// record does not define, and keys already notified for this app, are
    /// dropped.
    pub fn classify(
        &mut self,
        app_id: u32,
        event: &FileChangeEvent,
        record: &GameAchievementRecord,
        now_ms: i64,
    ) -> Vec<String> {
        let now = now_ms / 1000;
        self.expire_notified(now);

        let known: HashSet<&str> = record
            .achievements
            .iter()
            .map(|a| a.definition.key.as_str())
            .collect();

        let mut unlocked = Vec::new();
        for key in self.detect(event, record, now) {
            if !known.contains(key.as_str()) {
                continue;
            }
            let marker = format!("{}_{}", app_id, key);
            if self.notified.insert(marker) {
                unlocked.push(key);
            }
        }
        unlocked
    }

    /// Releases the `Processing` gate once the pipeline for the last
    /// admitted event has completed.
    pub fn finish(&mut self) {
        self.state = State::Idle;
    }

    pub fn clear_notified(&mut self) {
        self.notified.clear();
    }

    fn expire_notified(&mut self, now: i64) {
        if now - self.notified_cleared_at >= self.notified_ttl_secs {
            self.notified.clear();
            self.notified_cleared_at = now;
        }
    }

    fn detect(
        &self,
        event: &FileChangeEvent,
        record: &GameAchievementRecord,
        now: i64,
    ) -> Vec<String> {
        // 1. Appended lines: a new bracket section or a TENOKE dict line with
        //    a just-now timestamp names the achievement directly.
        let mut keys = Vec::new();
        for line in &event.added_lines {
            keys.extend(section_names_in_line(line));
            if let Some(tuple) = parse_dict_line(line) {
                if (now - tuple.unlocked_at).abs() <= self.direct_window_secs {
                    keys.push(tuple.key);
                }
            }
        }
        if !keys.is_empty() {
            return dedup(keys);
        }

        // 2. Rewritten JSON payload: compare unlock times to the clock.
        if event.path.to_ascii_lowercase().ends_with(".json") {
            let keys = recent_unlocks_from_json(&event.content, now, self.direct_window_secs);
            if !keys.is_empty() {
                return keys;
            }
        }

        // 3. Fallback: whatever the re-parsed record says unlocked recently,
        //    with a wider window to absorb write and flush lag.
        record
            .achievements
            .iter()
            .filter(|a| {
                a.state.unlocked && (now - a.state.unlocked_at).abs() <= self.fallback_window_secs
            })
            .map(|a| a.definition.key.clone())
            .collect()
    }
}

fn dedup(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}
