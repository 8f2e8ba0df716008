//! Event classification and routing.

use log_sentinel::config::EngineSettings;
use log_sentinel::watcher::{FsEvent, FsEventKind};

use super::{append, dir_rule, file_rule, Harness};

#[tokio::test]
async fn test_write_to_unwatched_path_is_ignored() {
    let h = Harness::new();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    let other = h.path("notes.txt");
    std::fs::write(&other, "panic\n").unwrap();
    let alerts = h
        .engine
        .handle_event(FsEvent::new(&other, FsEventKind::Write))
        .await;

    assert_eq!(alerts, 0);
    assert!(!h.engine.offsets().contains(&other));
}

#[tokio::test]
async fn test_keyword_match_is_case_insensitive_substring() {
    let mut h = Harness::new();
    let log = h.path("app.log");
    std::fs::write(&log, "").unwrap();
    h.engine
        .register_file(&file_rule(&log, &["error"]))
        .unwrap();

    append(&log, "ERROR: disk full\nall fine\nPreeerror\n");
    let alerts = h
        .engine
        .handle_event(FsEvent::new(&log, FsEventKind::Write))
        .await;

    assert_eq!(alerts, 2);
    let messages = [h.next_alert().await.unwrap(), h.next_alert().await.unwrap()];
    assert!(messages.iter().any(|m| m.contains("ERROR: disk full")));
    assert!(messages.iter().any(|m| m.contains("Preeerror")));
}

#[tokio::test]
async fn test_remove_then_create_starts_fresh() {
    let h = Harness::new();
    let log = h.path("a.log");
    std::fs::write(&log, "0123456789").unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    std::fs::remove_file(&log).unwrap();
    h.engine
        .handle_event(FsEvent::new(&log, FsEventKind::Remove))
        .await;
    assert!(!h.engine.offsets().contains(&log));

    std::fs::write(&log, "x\n").unwrap();
    h.engine
        .handle_event(FsEvent::new(&log, FsEventKind::Create))
        .await;
    assert_eq!(h.engine.offsets().get(&log), Some(0));
}

#[tokio::test]
async fn test_rename_drops_old_identity() {
    let h = Harness::new();
    let log = h.path("a.log");
    let rotated = h.path("a.log.1");
    std::fs::write(&log, "0123456789").unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    std::fs::rename(&log, &rotated).unwrap();
    h.engine
        .handle_event(FsEvent::new(&log, FsEventKind::Rename))
        .await;
    h.engine
        .handle_event(FsEvent::new(&rotated, FsEventKind::Create))
        .await;

    assert!(!h.engine.offsets().contains(&log));
    assert!(!h.engine.offsets().contains(&rotated));
}

#[tokio::test]
async fn test_file_rule_survives_rotation() {
    let mut h = Harness::new();
    let log = h.path("service.log");
    std::fs::write(&log, "old panic\n").unwrap();
    h.engine
        .register_file(&file_rule(&log, &["panic"]))
        .unwrap();

    std::fs::remove_file(&log).unwrap();
    h.engine
        .handle_event(FsEvent::new(&log, FsEventKind::Remove))
        .await;

    std::fs::write(&log, "panic: after rotation\n").unwrap();
    h.engine
        .handle_event(FsEvent::new(&log, FsEventKind::Create))
        .await;
    let alerts = h
        .engine
        .handle_event(FsEvent::new(&log, FsEventKind::Write))
        .await;

    assert_eq!(alerts, 1);
    assert!(h.next_alert().await.unwrap().contains("after rotation"));
}

#[tokio::test]
async fn test_oversized_new_file_is_not_tracked() {
    let settings = EngineSettings {
        max_file_size: 8,
        ..EngineSettings::default()
    };
    let h = Harness::with_settings(&settings);
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    let big = h.path("big.log");
    std::fs::write(&big, "panic panic panic\n").unwrap();
    h.engine
        .handle_event(FsEvent::new(&big, FsEventKind::Create))
        .await;
    let alerts = h
        .engine
        .handle_event(FsEvent::new(&big, FsEventKind::Write))
        .await;

    assert!(!h.engine.offsets().contains(&big));
    assert_eq!(alerts, 0);
}

#[tokio::test]
async fn test_read_error_leaves_offset_untouched() {
    let h = Harness::new();
    let log = h.path("a.log");
    std::fs::write(&log, "0123456789").unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    std::fs::remove_file(&log).unwrap();
    let alerts = h
        .engine
        .handle_event(FsEvent::new(&log, FsEventKind::Write))
        .await;

    assert_eq!(alerts, 0);
    assert_eq!(h.engine.offsets().get(&log), Some(10));
}

#[tokio::test]
async fn test_new_subdirectory_is_watched_and_scanned() {
    let h = Harness::new();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], true, &["skip"]))
        .unwrap();

    std::fs::create_dir_all(h.path("new/inner")).unwrap();
    std::fs::create_dir_all(h.path("new/skip-me")).unwrap();
    std::fs::write(h.path("new/inner/x.log"), "abc").unwrap();
    h.engine
        .handle_event(FsEvent::new(h.path("new"), FsEventKind::Create))
        .await;

    let added = h.source.added();
    assert!(added.contains(&h.path("new")));
    assert!(added.contains(&h.path("new/inner")));
    assert!(!added.contains(&h.path("new/skip-me")));
    assert_eq!(h.engine.offsets().get(&h.path("new/inner/x.log")), Some(3));
}

#[tokio::test]
async fn test_new_subdirectory_under_flat_rule_is_ignored() {
    let h = Harness::new();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    std::fs::create_dir(h.path("sub")).unwrap();
    h.engine
        .handle_event(FsEvent::new(h.path("sub"), FsEventKind::Create))
        .await;

    assert!(!h.source.added().contains(&h.path("sub")));
}

#[tokio::test]
async fn test_removed_directory_releases_watch() {
    let h = Harness::new();
    std::fs::create_dir(h.path("sub")).unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], true, &[]))
        .unwrap();
    assert!(h.engine.registry().is_watched(&h.path("sub")));

    std::fs::remove_dir(h.path("sub")).unwrap();
    h.engine
        .handle_event(FsEvent::new(h.path("sub"), FsEventKind::Remove))
        .await;

    assert!(!h.engine.registry().is_watched(&h.path("sub")));
    assert_eq!(*h.source.removed.lock().unwrap(), vec![h.path("sub")]);
}

#[tokio::test]
async fn test_renamed_directory_rewatches_children_when_restored() {
    let h = Harness::new();
    std::fs::create_dir_all(h.path("a/b")).unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], true, &[]))
        .unwrap();

    std::fs::rename(h.path("a"), h.path("z")).unwrap();
    h.engine
        .handle_event(FsEvent::new(h.path("a"), FsEventKind::Rename))
        .await;
    h.engine
        .handle_event(FsEvent::new(h.path("z"), FsEventKind::Create))
        .await;
    assert!(!h.engine.registry().is_watched(&h.path("a/b")));
    assert!(h.engine.registry().is_watched(&h.path("z/b")));

    std::fs::rename(h.path("z"), h.path("a")).unwrap();
    h.engine
        .handle_event(FsEvent::new(h.path("z"), FsEventKind::Rename))
        .await;
    h.engine
        .handle_event(FsEvent::new(h.path("a"), FsEventKind::Create))
        .await;

    let nested = h.path("a/b");
    assert!(h.engine.registry().is_watched(&nested));
    assert!(!h.engine.registry().is_watched(&h.path("z/b")));
    let added = h.source.added();
    assert_eq!(added.iter().filter(|p| **p == nested).count(), 2);
    assert!(h.source.removed.lock().unwrap().contains(&h.path("z/b")));
}

#[tokio::test]
async fn test_long_line_does_not_hide_neighbouring_matches() {
    let settings = EngineSettings {
        buffer_size: 16,
        ..EngineSettings::default()
    };
    let mut h = Harness::with_settings(&settings);
    let log = h.path("a.log");
    std::fs::write(&log, "").unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    let content = format!("panic: first\n{}\npanic: after\n", "x".repeat(40));
    append(&log, &content);
    let alerts = h
        .engine
        .handle_event(FsEvent::new(&log, FsEventKind::Write))
        .await;

    assert_eq!(alerts, 2);
    assert_eq!(h.engine.offsets().get(&log), Some(content.len() as u64));
    let messages = [h.next_alert().await.unwrap(), h.next_alert().await.unwrap()];
    assert!(messages.iter().any(|m| m.contains("panic: first")));
    assert!(messages.iter().any(|m| m.contains("panic: after")));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_directories_are_never_followed() {
    use std::os::unix::fs::symlink;

    let h = Harness::new();
    std::fs::create_dir(h.path("real")).unwrap();
    std::fs::write(h.path("real/x.log"), "abc").unwrap();
    symlink(h.path("real"), h.path("alias")).unwrap();

    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], true, &[]))
        .unwrap();
    assert!(h.engine.registry().is_watched(&h.path("real")));
    assert!(!h.engine.registry().is_watched(&h.path("alias")));

    symlink(h.path("real"), h.path("late")).unwrap();
    symlink(&h.root, h.path("loop")).unwrap();
    h.engine
        .handle_event(FsEvent::new(h.path("late"), FsEventKind::Create))
        .await;
    h.engine
        .handle_event(FsEvent::new(h.path("loop"), FsEventKind::Create))
        .await;

    assert!(!h.engine.registry().is_watched(&h.path("late")));
    assert!(!h.engine.registry().is_watched(&h.path("loop")));
    assert!(!h.engine.offsets().contains(&h.path("late/x.log")));
    assert_eq!(h.source.added(), vec![h.root.clone(), h.path("real")]);
}
