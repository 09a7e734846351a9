use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use super::debouncer::Debouncer;
use super::pairing::ChunkPairing;
use super::watch_roots::WatchRoots;
use crate::reload::classify::{FsEventKind, RawEvent};
use crate::reload::kind::ChunkShapes;
use crate::reload::url::{HashPattern, UrlMapper};

const WINDOW: Duration = Duration::from_millis(50);
const IDLE: Duration = Duration::from_secs(86400);

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn rename_kind(mode: notify::event::RenameMode) -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Name(mode))
}

fn raw(path: &str, kind: FsEventKind) -> RawEvent {
    RawEvent::new(path, kind)
}

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new(WINDOW);
    assert!(!debouncer.is_ready());
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_event_mapping_by_kind() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/out/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/out/b.css"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/out/c.png"], remove_kind()));

    assert_eq!(
        debouncer.pending,
        vec![
            raw("/out/a.js", FsEventKind::Add),
            raw("/out/b.css", FsEventKind::Change),
            raw("/out/c.png", FsEventKind::Remove),
        ]
    );
}

#[test]
fn test_events_are_appended_in_order() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/out/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/out/a.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/out/a.js"], remove_kind()));

    let kinds: Vec<_> = debouncer.pending.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![FsEventKind::Add, FsEventKind::Change, FsEventKind::Remove]
    );
}

#[test]
fn test_rename_events() {
    use notify::event::RenameMode;

    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.add_event(&make_event(
        vec!["/out/style.css.tmp1", "/out/style-aaa111.css"],
        rename_kind(RenameMode::Both),
    ));
    debouncer.add_event(&make_event(vec!["/out/old.js"], rename_kind(RenameMode::From)));
    debouncer.add_event(&make_event(vec!["/out/new.js"], rename_kind(RenameMode::To)));

    assert_eq!(
        debouncer.pending,
        vec![
            raw("/out/style.css.tmp1", FsEventKind::Remove),
            raw("/out/style-aaa111.css", FsEventKind::Add),
            raw("/out/old.js", FsEventKind::Remove),
            raw("/out/new.js", FsEventKind::Add),
        ]
    );
}

#[test]
fn test_metadata_and_access_ignored() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(
        vec!["/out/a.js"],
        notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
            notify::event::MetadataKind::WriteTime,
        )),
    ));
    debouncer.add_event(&make_event(
        vec!["/out/a.js"],
        notify::EventKind::Access(notify::event::AccessKind::Read),
    ));

    assert!(debouncer.pending.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/out/real.js"], modify_kind()));
    let first_time = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    // temp files neither extend the window nor join the batch
    debouncer.add_event(&make_event(vec!["/out/real.js.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/out/real.js~"], modify_kind()));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.pending.len(), 1);
}

#[test]
fn test_directory_events_kept() {
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.add_event(&make_event(
        vec!["/out/pages"],
        notify::EventKind::Create(notify::event::CreateKind::Folder),
    ));
    assert_eq!(debouncer.pending, vec![raw("/out/pages", FsEventKind::Add)]);
}

#[test]
fn test_not_ready_within_window() {
    let mut debouncer = Debouncer::new(Duration::from_secs(60));
    debouncer.add_event(&make_event(vec!["/out/a.css"], modify_kind()));

    assert!(!debouncer.is_ready());
    assert!(debouncer.take_if_ready().is_none());
    assert_eq!(debouncer.pending.len(), 1);
}

#[test]
fn test_take_after_window_hands_over_whole_batch() {
    let mut debouncer = Debouncer::new(Duration::from_millis(10));
    debouncer.add_event(&make_event(vec!["/out/a-aaaaaa11.css"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/out/a-bbbbbb22.css"], create_kind()));

    std::thread::sleep(Duration::from_millis(30));

    let batch = debouncer.take_if_ready().expect("batch ready");
    assert_eq!(batch.len(), 2);
    assert!(debouncer.pending.is_empty());
    assert!(debouncer.last_event.is_none());
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_new_event_restarts_window() {
    let mut debouncer = Debouncer::new(Duration::from_millis(200));
    debouncer.add_event(&make_event(vec!["/out/a.css"], modify_kind()));
    std::thread::sleep(Duration::from_millis(120));
    debouncer.add_event(&make_event(vec!["/out/b.css"], modify_kind()));
    std::thread::sleep(Duration::from_millis(120));

    // past the window since the first event, not since the last
    assert!(!debouncer.is_ready());
}

#[test]
fn test_sleep_duration_no_events() {
    let debouncer = Debouncer::new(WINDOW);
    assert_eq!(debouncer.sleep_duration(IDLE), IDLE);
    assert_eq!(
        debouncer.sleep_duration(Duration::from_millis(500)),
        Duration::from_millis(500)
    );
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = Debouncer::new(Duration::from_millis(300));
    debouncer.last_event = Some(std::time::Instant::now());

    let dur = debouncer.sleep_duration(IDLE);
    assert!(dur >= Duration::from_millis(290));
    assert!(dur <= Duration::from_millis(300));
}

#[test]
fn test_sleep_duration_never_zero() {
    let mut debouncer = Debouncer::new(Duration::from_millis(1));
    debouncer.last_event = Some(std::time::Instant::now());
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(debouncer.sleep_duration(IDLE), Duration::from_millis(1));
}

fn pairing(hold: Duration) -> ChunkPairing {
    ChunkPairing::new(
        UrlMapper::new("/out", "/public/", HashPattern::default()),
        ChunkShapes::default(),
        hold,
    )
}

#[test]
fn test_pairing_detects_lone_shared_chunk() {
    let pairing = pairing(WINDOW);

    assert!(pairing.awaits_page(&[raw("/out/chunk-aaaaaa11.js", FsEventKind::Add)]));
    assert!(!pairing.awaits_page(&[
        raw("/out/chunk-aaaaaa11.js", FsEventKind::Add),
        raw("/out/home.page-a1b2c3d4.js", FsEventKind::Add),
    ]));
    assert!(!pairing.awaits_page(&[raw("/out/style-aaaaaa11.css", FsEventKind::Add)]));
    assert!(!pairing.awaits_page(&[raw("/elsewhere/chunk-aaaaaa11.js", FsEventKind::Add)]));
}

#[test]
fn test_shared_chunk_waits_for_page_chunk() {
    let mut debouncer =
        Debouncer::new(Duration::from_millis(10)).with_pairing(pairing(Duration::from_secs(60)));

    debouncer.add_event(&make_event(vec!["/out/chunk-aaaaaa11.js"], create_kind()));
    std::thread::sleep(Duration::from_millis(40));
    assert!(!debouncer.is_ready());
    assert!(debouncer.sleep_duration(IDLE) > Duration::from_secs(50));

    debouncer.add_event(&make_event(vec!["/out/home.page-a1b2c3d4.js"], create_kind()));
    std::thread::sleep(Duration::from_millis(40));

    let batch = debouncer.take_if_ready().expect("batch ready");
    assert_eq!(batch.len(), 2);
}

#[test]
fn test_lone_shared_chunk_released_after_hold() {
    let mut debouncer =
        Debouncer::new(Duration::from_millis(10)).with_pairing(pairing(Duration::from_millis(30)));

    debouncer.add_event(&make_event(vec!["/out/chunk-aaaaaa11.js"], create_kind()));
    std::thread::sleep(Duration::from_millis(80));

    let batch = debouncer.take_if_ready().expect("batch ready");
    assert_eq!(batch, vec![raw("/out/chunk-aaaaaa11.js", FsEventKind::Add)]);
}

#[test]
fn test_pairing_leaves_css_batches_alone() {
    let mut debouncer =
        Debouncer::new(Duration::from_millis(10)).with_pairing(pairing(Duration::from_secs(60)));

    debouncer.add_event(&make_event(vec!["/out/style-aaaaaa11.css"], modify_kind()));
    std::thread::sleep(Duration::from_millis(30));
    assert!(debouncer.is_ready());
}

#[test]
fn test_watch_roots_reattach_after_recreate() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("dist");
    let mut watcher = notify::recommended_watcher(|_: notify::Result<notify::Event>| {}).unwrap();

    let mut roots = WatchRoots::new(vec![root.clone()]);
    roots.attach_existing(&mut watcher).unwrap();
    assert!(!roots.is_complete());
    assert!(!roots.maintain(&mut watcher));

    std::fs::create_dir_all(&root).unwrap();
    assert!(roots.maintain(&mut watcher));
    assert!(roots.is_complete());
    assert!(!roots.maintain(&mut watcher));

    std::fs::remove_dir_all(&root).unwrap();
    assert!(!roots.maintain(&mut watcher));
    assert!(!roots.is_complete());
}
