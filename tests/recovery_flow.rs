use std::path::Path;

use chrono::{TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempfile::TempDir;

use focus_dojo::Dojo;
use focus_dojo::clock::ManualClock;
use focus_dojo::config::{Config, RecoveryFormula, SkimPolicy};
use focus_dojo::content::{Content, PhrasePool};
use focus_dojo::session::Step;
use focus_dojo::store::{Exercise, JsonStore, ScoreBoard};

const PASSAGE: &str = "One two three four. Five six seven eight. Nine ten eleven twelve.";

fn make_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
}

fn make_content() -> Content {
    Content {
        language: "en".to_string(),
        zen_quotes: PhrasePool::from(vec!["be still"]),
        drills: PhrasePool::from(vec!["she sells sea shells"]),
        fallback_drill: None,
    }
}

fn open_dojo(dir: &Path, clock: &ManualClock, config: Config) -> Dojo {
    let store = JsonStore::with_base_dir(dir.to_path_buf()).unwrap();
    let board = ScoreBoard::load(Box::new(store), clock.shared(), config.scoring.clone());
    Dojo::new(
        config,
        make_content(),
        board,
        clock.shared(),
        SmallRng::seed_from_u64(42),
    )
}

fn read_calmly(dojo: &mut Dojo, clock: &ManualClock) -> u8 {
    dojo.start_reading(PASSAGE, "passage").unwrap();
    loop {
        clock.advance_ms(3_000);
        if let Step::Completed(result) = dojo.advance_reading().unwrap().step {
            return result.score;
        }
    }
}

fn type_phrase(dojo: &mut Dojo) {
    dojo.retry_typing();
    let target = dojo.typing.target().to_string();
    for ch in target.chars() {
        dojo.type_char(ch);
    }
}

#[test]
fn scores_survive_restart() {
    let dir = TempDir::new().unwrap();
    let clock = make_clock();

    {
        let mut dojo = open_dojo(dir.path(), &clock, Config::default());
        assert_eq!(read_calmly(&mut dojo, &clock), 100);
        type_phrase(&mut dojo);
        // 0.4 * 100 * 0.7 + 0.3 * 100 * 0.7
        assert_eq!(dojo.recovery_score(), 49);
    }

    let dojo = open_dojo(dir.path(), &clock, Config::default());
    assert_eq!(dojo.scoreboard.rolling_average(Exercise::FocusReader), 100);
    assert_eq!(dojo.scoreboard.history(Exercise::ZenType), &[100]);
    assert_eq!(dojo.recovery_score(), 49);
}

#[test]
fn next_day_decays_and_resets_confidence() {
    let dir = TempDir::new().unwrap();
    let clock = make_clock();

    {
        let mut dojo = open_dojo(dir.path(), &clock, Config::default());
        read_calmly(&mut dojo, &clock);
        type_phrase(&mut dojo);
    }

    clock.advance_days(1);
    let dojo = open_dojo(dir.path(), &clock, Config::default());
    assert_eq!(dojo.scoreboard.rolling_average(Exercise::FocusReader), 80);
    assert_eq!(dojo.scoreboard.rolling_average(Exercise::ZenType), 80);
    assert!(dojo.scoreboard.history(Exercise::FocusReader).is_empty());
    // No attempts yet today, so nothing counts.
    assert_eq!(dojo.recovery_score(), 0);

    let mut flat = Config::default();
    flat.scoring.recovery_formula = RecoveryFormula::Flat;
    let dojo = open_dojo(dir.path(), &clock, flat);
    assert_eq!(dojo.recovery_score(), 56);
}

#[test]
fn skimming_lowers_recorded_score() {
    let dir = TempDir::new().unwrap();
    let clock = make_clock();
    let mut dojo = open_dojo(dir.path(), &clock, Config::default());

    dojo.start_reading(PASSAGE, "passage").unwrap();
    dojo.advance_reading();
    // Four words in a tenth of a second.
    clock.advance_ms(100);
    let advance = dojo.advance_reading().unwrap();
    assert_eq!(advance.penalties.len(), 1);
    assert!(advance.penalties[0].is_skim());
    clock.advance_ms(3_000);
    dojo.advance_reading();

    assert_eq!(dojo.scoreboard.history(Exercise::FocusReader), &[90]);
    let result = dojo.last_reading.as_ref().unwrap();
    assert_eq!(result.skimming_count, 1);
    assert_eq!(result.total_words_read, 8);
}

#[test]
fn blocking_policy_holds_the_sentence() {
    let dir = TempDir::new().unwrap();
    let clock = make_clock();
    let mut config = Config::default();
    config.reader.skim_policy = SkimPolicy::Block;
    let mut dojo = open_dojo(dir.path(), &clock, config);

    dojo.start_reading(PASSAGE, "passage").unwrap();
    dojo.advance_reading();
    clock.advance_ms(100);
    assert_eq!(dojo.advance_reading().unwrap().step, Step::Blocked);
    assert_eq!(dojo.reader.as_ref().unwrap().active_index(), 1);

    clock.advance_ms(3_000);
    assert_eq!(
        dojo.advance_reading().unwrap().step,
        Step::Advanced { index: 2 }
    );
    assert_eq!(dojo.reader.as_ref().unwrap().score(), 90);
}

#[test]
fn export_then_import_into_fresh_store() {
    let clock = make_clock();
    let source = TempDir::new().unwrap();
    let mut dojo = open_dojo(source.path(), &clock, Config::default());
    type_phrase(&mut dojo);
    let exported = serde_json::to_string(&dojo.scoreboard.export()).unwrap();

    let target = TempDir::new().unwrap();
    let mut fresh = open_dojo(target.path(), &clock, Config::default());
    assert_eq!(fresh.scoreboard.rolling_average(Exercise::ZenType), 0);
    fresh
        .scoreboard
        .import(serde_json::from_str(&exported).unwrap())
        .unwrap();
    drop(fresh);

    let reopened = open_dojo(target.path(), &clock, Config::default());
    assert_eq!(reopened.scoreboard.rolling_average(Exercise::ZenType), 100);
}

#[test]
fn corrupt_store_starts_fresh() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("focus-dojo-storage.json"), "{ not json").unwrap();
    let clock = make_clock();
    let mut dojo = open_dojo(dir.path(), &clock, Config::default());
    assert_eq!(dojo.recovery_score(), 0);

    type_phrase(&mut dojo);
    let raw = std::fs::read_to_string(dir.path().join("focus-dojo-storage.json")).unwrap();
    assert!(raw.contains("\"zenType\""));
}

#[test]
fn library_article_runs_under_its_id() {
    let dir = TempDir::new().unwrap();
    let clock = make_clock();
    let mut dojo = open_dojo(dir.path(), &clock, Config::default());

    let id = focus_dojo::content::library_ids()[3];
    let text = focus_dojo::content::library_text(id).unwrap();
    dojo.start_reading(&text, id).unwrap();
    assert_eq!(dojo.reader.as_ref().unwrap().source_id(), "deep-work");

    let score = loop {
        clock.advance_ms(5_000);
        if let Step::Completed(result) = dojo.advance_reading().unwrap().step {
            assert_eq!(result.source_id, "deep-work");
            break result.score;
        }
    };
    assert_eq!(score, 100);
    assert_eq!(dojo.scoreboard.history(Exercise::FocusReader), &[100]);
}
