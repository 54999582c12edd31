use std::{rc::Rc, time::Duration};

use keepsake_core::{
    assets::MemoryAssets, AppConfig, FileStorage, IdentityResolver, MemoryStorage,
    ProgressStore, SceneEnv, SceneId, SceneInput, SceneRegistry, SceneRouter, StorageBackend,
};

const KEY: &str = "vday_progress_v1";

const LYRICS: &str = "[ti:Our Song]\n\
                      [00:00.50]<00:00.50>First <00:01.20>line\n\
                      [00:04.00]Second line\n\
                      [00:08.00][01:30.00]Chorus";

fn assets() -> MemoryAssets {
    MemoryAssets::new()
        .with("data/lyrics.lrc", LYRICS)
        .with(
            "data/photos.json",
            r#"["photos/a.jpg", "photos/b.jpg", "photos/c.png", "clips/d.mp4"]"#,
        )
}

fn router(backend: Box<dyn StorageBackend>) -> SceneRouter {
    let env = SceneEnv::new(
        AppConfig::default(),
        Rc::new(assets()),
        Rc::new(IdentityResolver),
    )
    .with_seed(42);
    SceneRouter::new(env, SceneRegistry::standard(), ProgressStore::open(backend, KEY))
}

/// Ticks every 100 ms until the router leaves `scene` or `limit` passes.
fn run_while_in(router: &mut SceneRouter, now: &mut Duration, scene: SceneId, limit: Duration) {
    let deadline = *now + limit;
    while router.current() == scene && *now <= deadline {
        *now += Duration::from_millis(100);
        router.tick(*now);
    }
}

fn solve_puzzle(router: &mut SceneRouter) {
    let tile_at = |router: &SceneRouter, position: usize| {
        router
            .view()
            .prop(&format!("tile-{position}"), "tile")
            .map(|tile| tile as usize)
    };
    for target in 0..9 {
        let from = (0..9).find(|&position| tile_at(router, position) == Some(target));
        match from {
            Some(from) if from != target => {
                router.dispatch(SceneInput::TapTile(target));
                router.dispatch(SceneInput::TapTile(from));
            }
            _ => {}
        }
    }
}

#[test]
fn gate_counts_misses_and_opens_on_the_phrase() {
    let storage = MemoryStorage::new();
    let mut router = router(Box::new(storage.clone()));
    router.start(Duration::ZERO);
    assert_eq!(router.current(), SceneId::Password);

    router.dispatch(SceneInput::Submit("sunshine".into()));
    assert_eq!(router.current(), SceneId::Password);
    assert_eq!(router.progress().snapshot().attempts, 1);
    assert_eq!(
        router.view().text("password-error"),
        Some("That is not quite right.")
    );

    router.dispatch(SceneInput::Submit("  Snowflake ".into()));
    assert_eq!(router.current(), SceneId::Intro);
    assert_eq!(router.progress().snapshot().attempts, 1);

    let stored = storage.raw(KEY).unwrap();
    assert!(stored.contains("\"scene\":\"intro\""));
    assert!(stored.contains("\"attempts\":1"));
}

#[test]
fn full_visit_reaches_the_gift() {
    let storage = MemoryStorage::new();
    let mut router = router(Box::new(storage.clone()));
    let mut now = Duration::ZERO;
    router.start(now);

    router.dispatch(SceneInput::Submit("snowflake".into()));
    router.dispatch(SceneInput::MediaEnded);
    assert_eq!(router.current(), SceneId::CardOpen);

    router.dispatch(SceneInput::Tap);
    now += Duration::from_secs(2);
    router.tick(now);
    router.dispatch(SceneInput::Continue);
    assert_eq!(router.current(), SceneId::Song);
    assert!(router.scroll_locked());

    run_while_in(&mut router, &mut now, SceneId::Song, Duration::from_secs(10));
    assert_eq!(router.view().text("lyrics-current"), Some("Chorus"));
    run_while_in(&mut router, &mut now, SceneId::Song, Duration::from_secs(200));
    assert_eq!(router.current(), SceneId::Envelope);
    assert!(now >= Duration::from_secs(174));

    router.dispatch(SceneInput::Tap);
    router.dispatch(SceneInput::Continue);
    assert_eq!(router.current(), SceneId::Reveal);
    assert!(!router.scroll_locked());

    solve_puzzle(&mut router);
    assert_eq!(router.view().text("puzzle-status"), Some("Puzzle solved."));
    run_while_in(&mut router, &mut now, SceneId::Reveal, Duration::from_secs(40));
    assert_eq!(router.current(), SceneId::Final);

    router.dispatch(SceneInput::TapClue("rose".into()));
    router.dispatch(SceneInput::TapClue("moon".into()));
    router.dispatch(SceneInput::DragClue {
        id: "spark".into(),
        progress: 0.9,
    });
    assert_eq!(
        router.progress().snapshot().found_clues,
        vec!["rose", "moon", "spark"]
    );

    router.dispatch(SceneInput::Submit("rose moon spark".into()));
    assert_eq!(router.current(), SceneId::Gift);
    assert!(router.is_finished());

    // A later visit resumes where this one ended.
    drop(router);
    let mut again = self::router(Box::new(storage));
    again.start(Duration::ZERO);
    assert_eq!(again.current(), SceneId::Gift);
    assert_eq!(again.progress().snapshot().found_clues.len(), 3);
}

#[test]
fn progress_survives_a_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = router(Box::new(FileStorage::new(dir.path())));
    first.start(Duration::ZERO);
    first.dispatch(SceneInput::Submit("snowflake".into()));
    first.dispatch(SceneInput::MediaEnded);
    assert_eq!(first.current(), SceneId::CardOpen);
    drop(first);

    let mut second = router(Box::new(FileStorage::new(dir.path())));
    second.start(Duration::ZERO);
    assert_eq!(second.current(), SceneId::CardOpen);

    second.reset();
    assert_eq!(second.current(), SceneId::Password);
    drop(second);

    let mut third = router(Box::new(FileStorage::new(dir.path())));
    third.start(Duration::ZERO);
    assert_eq!(third.current(), SceneId::Password);
    assert_eq!(third.progress().snapshot().attempts, 0);
}

#[test]
fn corrupt_progress_starts_over() {
    let storage = MemoryStorage::new();
    storage.put_raw(KEY, "{not json");
    let mut router = router(Box::new(storage.clone()));
    router.start(Duration::ZERO);
    assert_eq!(router.current(), SceneId::Password);

    storage.put_raw(KEY, r#"{"state":"clickopen","foundClues":"rose","attempts":-4}"#);
    let mut legacy = self::router(Box::new(storage));
    legacy.start(Duration::ZERO);
    assert_eq!(legacy.current(), SceneId::Password);
    let record = legacy.progress().snapshot();
    assert!(record.found_clues.is_empty());
    assert_eq!(record.attempts, 0);
}
