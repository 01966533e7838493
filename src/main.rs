mod appid;
mod classifier;
mod config;
mod library;
mod notifications;
mod parsers;
mod reconcile;
mod records;
mod registry;
mod scoring;
mod steam_api;
mod store;
mod watcher;

use chrono::Utc;
use classifier::ChangeClassifier;
use config::{AppConfig, ConfigManager};
use library::{GameLibrary, LibraryGame, SharedLibrary};
use notifications::NotificationManager;
use parsers::ParserContext;
use records::{AchievementEntry, RecordStore, SharedRecordStore};
use registry::{SharedRegistry, TrackedFileRegistry};
use scoring::{score_game, user_profile, GameMeta};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use steam_api::SteamAchievementClient;
use watcher::FileWatcher;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let config = ConfigManager::new().get_all();
    let records = RecordStore::open("achievements.json")?;
    let registry = TrackedFileRegistry::open("tracked.json")?;
    let library = GameLibrary::open("games.json")?;

    match args.split_first() {
        None => monitor(&config, &records, &registry, &library).await,
        Some((cmd, rest)) => match (cmd.as_str(), rest) {
            ("add", [exe_path]) => {
                let app_id = appid::resolve_app_id(Path::new(exe_path)).ok_or_else(|| {
                    format!(
                        "Could not determine app id from {}; pass it explicitly: add <app_id> <exe_path>",
                        exe_path
                    )
                })?;
                add_game(&config, &records, &registry, &library, app_id, exe_path).await
            }
            ("add", [app_id, exe_path]) => {
                let app_id = parse_app_id(app_id)?;
                add_game(&config, &records, &registry, &library, app_id, exe_path).await
            }
            ("remove", [app_id]) => {
                let app_id = parse_app_id(app_id)?;
                reconcile::remove_game(&records, &registry, app_id)?;
                library.remove(app_id)?;
                println!("✓ Removed game {}", app_id);
                Ok(())
            }
            ("reset", [app_id]) => {
                let app_id = parse_app_id(app_id)?;
                reconcile::reset_achievements(&records, &registry, app_id)?;
                println!("✓ Reset achievements for game {}", app_id);
                Ok(())
            }
            ("score", []) => print_scores(&records),
            _ => Err(usage()),
        },
    }
}

fn usage() -> String {
    "Usage: trophyvault [add <exe_path> | add <app_id> <exe_path> | remove <app_id> | reset <app_id> | score]\n\
     Without arguments, watches tracked achievement files for unlocks."
        .to_string()
}

fn parse_app_id(raw: &str) -> Result<u32, String> {
    raw.parse().map_err(|_| format!("Invalid app id: {}", raw))
}

fn parser_context(config: &AppConfig, registry: &SharedRegistry, game: &LibraryGame) -> ParserContext {
    ParserContext::new(
        game.app_id,
        PathBuf::from(&game.exe_path),
        config.public_dir.clone(),
        config.app_data_dir.clone(),
        Arc::clone(registry),
    )
}

/// Add-game flow: fetch the schema into a fresh all-locked record, remember
/// the executable path, then run an eager parser pass so already-earned
/// achievements show up immediately.
async fn add_game(
    config: &AppConfig,
    records: &SharedRecordStore,
    registry: &SharedRegistry,
    library: &SharedLibrary,
    app_id: u32,
    exe_path: &str,
) -> Result<(), String> {
    let client = SteamAchievementClient::new(config.steam_api_key.clone());
    let record = client.build_record(app_id).await?;
    println!(
        "✓ {} ({}): {} achievements in schema",
        record.game_name,
        app_id,
        record.achievements.len()
    );

    records.put(&record)?;
    library.upsert(LibraryGame {
        app_id,
        name: record.game_name.clone(),
        exe_path: exe_path.to_string(),
    })?;

    let game = library
        .get(app_id)
        .ok_or_else(|| format!("Game {} vanished from library", app_id))?;
    let ctx = parser_context(config, registry, &game);
    if let Some(updated) = reconcile::run_parser_pass(records, &ctx)? {
        println!(
            "✓ {}/{} already unlocked on disk",
            updated.unlocked_count(),
            updated.achievements.len()
        );
    }

    Ok(())
}

fn print_scores(records: &SharedRecordStore) -> Result<(), String> {
    let mut game_scores = Vec::new();
    for app_id in records.game_ids() {
        if let Some(record) = records.get(app_id) {
            let score = score_game(&record, &GameMeta::default());
            println!(
                "  {} — {} pts, {:.1}% complete, {:?}",
                score.game_name, score.total_game_score, score.completion_percent, score.rank
            );
            game_scores.push(score);
        }
    }

    let profile = user_profile(&game_scores);
    println!(
        "🏆 Total: {} pts over {} game(s), {:.1}% average completion — {:?}",
        profile.total_score, profile.games_played, profile.average_completion, profile.overall_rank
    );
    for badge in &profile.badges {
        println!("  {}", badge);
    }

    Ok(())
}

/// The long-running mode: eager parser pass over every library game, then
/// watch the tracked files and push each admitted change through
/// classify → reconcile → notify.
async fn monitor(
    config: &AppConfig,
    records: &SharedRecordStore,
    registry: &SharedRegistry,
    library: &SharedLibrary,
) -> Result<(), String> {
    let games = library.all();
    println!("🏆 Watching achievements for {} game(s)", games.len());

    for game in &games {
        let ctx = parser_context(config, registry, game);
        match reconcile::run_parser_pass(records, &ctx) {
            Ok(Some(record)) => println!(
                "  ✓ {}: {}/{} unlocked",
                game.name,
                record.unlocked_count(),
                record.achievements.len()
            ),
            Ok(None) => println!(
                "  ⚠ No achievement record for {} - run `trophyvault add` first",
                game.name
            ),
            Err(e) => eprintln!("  ✗ Startup parse failed for {}: {}", game.name, e),
        }
    }

    let (file_watcher, mut events) = FileWatcher::new()?;
    let mut watched_paths = registry.paths();
    file_watcher.watch(&watched_paths);

    let notifier = NotificationManager::new(
        config.notifications_enabled,
        config.notification_sound_path.clone(),
    );
    let mut change_classifier = ChangeClassifier::new(config);
    let mut clear_interval =
        tokio::time::interval(Duration::from_secs(config.notified_ttl_secs.max(1)));
    clear_interval.tick().await;

    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                let Some(event) = maybe_event else { break };

                let Some(app_id) = registry.app_for_path(&event.path) else {
                    continue;
                };
                if !change_classifier.admit(&event, Utc::now().timestamp_millis()) {
                    continue;
                }

                if let Err(e) = handle_change(
                    config,
                    records,
                    registry,
                    library,
                    &notifier,
                    &mut change_classifier,
                    app_id,
                    &event,
                ) {
                    eprintln!("  ✗ Failed to process change for app {}: {}", app_id, e);
                }
                change_classifier.finish();

                // Parser passes can register new files; re-arm when the set
                // changed.
                let current = registry.paths();
                if current != watched_paths {
                    file_watcher.watch(&current);
                    watched_paths = current;
                }
            }
            _ = clear_interval.tick() => {
                change_classifier.clear_notified();
            }
        }
    }

    Ok(())
}

fn handle_change(
    config: &AppConfig,
    records: &SharedRecordStore,
    registry: &SharedRegistry,
    library: &SharedLibrary,
    notifier: &NotificationManager,
    change_classifier: &mut ChangeClassifier,
    app_id: u32,
    event: &classifier::FileChangeEvent,
) -> Result<(), String> {
    let game = library
        .get(app_id)
        .ok_or_else(|| format!("App {} is tracked but not in the library", app_id))?;

    let ctx = parser_context(config, registry, &game);
    let Some(record) = reconcile::run_parser_pass(records, &ctx)? else {
        return Err(format!("No achievement record for app {}", app_id));
    };

    let keys = change_classifier.classify(app_id, event, &record, Utc::now().timestamp_millis());
    if keys.is_empty() {
        return Ok(());
    }

    let unlocked: Vec<AchievementEntry> = keys
        .iter()
        .filter_map(|k| record.entry(k).cloned())
        .collect();
    for entry in &unlocked {
        println!(
            "🏆 {} unlocked: {}",
            record.game_name, entry.definition.display_name
        );
    }
    notifier.notify_unlocks(&record.game_name, &unlocked);

    Ok(())
}
