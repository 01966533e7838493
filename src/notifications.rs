use crate::records::AchievementEntry;
use notify_rust::Notification;
use std::thread;

/// Desktop toasts for unlock batches. One toast and one sound per batch no
/// matter how many achievements it carries; delivery failures are logged and
/// never bubble up - the record was already persisted by the time we get
/// here.
pub struct NotificationManager {
    enabled: bool,
    sound_name: Option<String>,
}

impl NotificationManager {
    pub fn new(enabled: bool, sound_name: Option<String>) -> Self {
        Self { enabled, sound_name }
    }

    pub fn notify_unlocks(&self, game_name: &str, unlocked: &[AchievementEntry]) {
        if !self.enabled || unlocked.is_empty() {
            return;
        }

        let (body, icon) = match unlocked {
            [single] => (
                format!(
                    "🏆 {}\n{}",
                    single.definition.display_name, single.definition.description
                ),
                single.definition.icon_unlocked.clone(),
            ),
            batch => (format!("🏆 {} achievements unlocked", batch.len()), None),
        };

        println!("🏆 {}: {}", game_name, body.replace('\n', " - "));

        let summary = game_name.to_string();
        let sound = self.sound_name.clone();
        thread::spawn(move || {
            let mut notification = Notification::new();
            notification.summary(&summary).body(&body).timeout(2500);
            if let Some(icon) = icon {
                notification.icon(&icon);
            }
            if let Some(sound) = sound {
                notification.sound_name(&sound);
            }
            if let Err(e) = notification.show() {
                eprintln!("  ⚠ Notification failed: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::test_record;

    #[test]
    fn disabled_manager_is_a_no_op() {
        let manager = NotificationManager::new(false, None);
        let record = test_record(10, &["ACH_A"]);
        // Must return without spawning anything.
        manager.notify_unlocks("Game", &record.achievements);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let manager = NotificationManager::new(true, None);
        manager.notify_unlocks("Game", &[]);
    }
}
