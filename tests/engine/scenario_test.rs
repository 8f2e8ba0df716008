//! End-to-end scenarios over a directory rule.

use log_sentinel::watcher::{FsEvent, FsEventKind};

use super::{append, dir_rule, Harness};

#[tokio::test]
async fn test_append_after_initial_scan_alerts_once() {
    let mut h = Harness::new();
    let log = h.path("a.log");
    std::fs::write(&log, "0123456789").unwrap();

    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();
    assert_eq!(h.engine.offsets().get(&log), Some(10));

    append(&log, "ok\npanic: boom\n");
    let alerts = h
        .engine
        .handle_event(FsEvent::new(&log, FsEventKind::Write))
        .await;

    assert_eq!(alerts, 1);
    assert_eq!(h.engine.offsets().get(&log), Some(25));

    let message = h.next_alert().await.expect("alert delivered");
    assert!(message.contains("panic: boom"));
    assert!(message.contains(&log.display().to_string()));
}

#[tokio::test]
async fn test_create_in_subdirectory_of_flat_rule_is_ignored() {
    let h = Harness::new();
    std::fs::create_dir(h.path("sub")).unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    let nested = h.path("sub/b.log");
    std::fs::write(&nested, "").unwrap();
    h.engine
        .handle_event(FsEvent::new(&nested, FsEventKind::Create))
        .await;

    assert!(!h.engine.offsets().contains(&nested));
}

#[tokio::test]
async fn test_create_direct_child_is_tailed_from_start() {
    let mut h = Harness::new();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    let log = h.path("fresh.log");
    std::fs::write(&log, "panic: early\n").unwrap();
    h.engine
        .handle_event(FsEvent::new(&log, FsEventKind::Create))
        .await;
    assert_eq!(h.engine.offsets().get(&log), Some(0));

    let alerts = h
        .engine
        .handle_event(FsEvent::new(&log, FsEventKind::Write))
        .await;
    assert_eq!(alerts, 1);
    assert!(h.next_alert().await.unwrap().contains("panic: early"));
}

#[tokio::test]
async fn test_recursive_rule_tails_nested_files() {
    let h = Harness::new();
    std::fs::create_dir(h.path("sub")).unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], true, &[]))
        .unwrap();

    let top = h.path("a.log");
    let nested = h.path("sub/b.log");
    std::fs::write(&top, "").unwrap();
    std::fs::write(&nested, "").unwrap();
    h.engine
        .handle_event(FsEvent::new(&top, FsEventKind::Create))
        .await;
    h.engine
        .handle_event(FsEvent::new(&nested, FsEventKind::Create))
        .await;

    assert_eq!(h.engine.offsets().get(&top), Some(0));
    assert_eq!(h.engine.offsets().get(&nested), Some(0));
}

#[tokio::test]
async fn test_excluded_subtree_yields_nothing() {
    let h = Harness::new();
    std::fs::create_dir_all(h.path("archive/2024")).unwrap();
    std::fs::write(h.path("archive/2024/old.log"), "panic\n").unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], true, &["archive"]))
        .unwrap();

    assert!(!h
        .source
        .added()
        .iter()
        .any(|p| p.starts_with(h.path("archive"))));

    let created = h.path("archive/2024/new.log");
    std::fs::write(&created, "panic: excluded\n").unwrap();
    h.engine
        .handle_event(FsEvent::new(&created, FsEventKind::Create))
        .await;
    let alerts = h
        .engine
        .handle_event(FsEvent::new(&created, FsEventKind::Write))
        .await;

    assert_eq!(alerts, 0);
    assert!(!h.engine.offsets().contains(&created));
}

#[tokio::test]
async fn test_reconcile_drops_deleted_file_once() {
    let h = Harness::new();
    let log = h.path("a.log");
    std::fs::write(&log, "0123456789").unwrap();
    h.engine
        .register_directory(&dir_rule(&h.root, &["panic"], false, &[]))
        .unwrap();

    std::fs::remove_file(&log).unwrap();

    let first = h.engine.reconcile().await;
    assert_eq!(first.removed, 1);
    assert!(!h.engine.offsets().contains(&log));

    let second = h.engine.reconcile().await;
    assert_eq!(second.removed, 0);
}
