use super::store::lexical_absolute;
use super::*;
use crate::error::PocketcamError;
use crate::events::{EventFilter, MediaEvent};
use crate::test_support::{event_bus, file_names, FaultyFilesystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn create_catalog() -> (TempDir, Arc<FaultyFilesystem>, MediaCatalog) {
    let temp_dir = TempDir::new().unwrap();
    let filesystem = FaultyFilesystem::new();
    let catalog = MediaCatalog::new(
        temp_dir.path(),
        Arc::clone(&filesystem) as Arc<dyn crate::storage::Filesystem>,
        event_bus(),
    );
    (temp_dir, filesystem, catalog)
}

fn touch(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"media").unwrap();
    path
}

#[tokio::test]
async fn test_list_filters_to_allowed_extensions() {
    let (temp_dir, _fs, catalog) = create_catalog();
    for name in ["a.jpg", "b.JPEG", "c.png", "d.MP4", "e.mov", "notes.txt", "archive.zip"] {
        touch(&temp_dir, name);
    }
    std::fs::create_dir(temp_dir.path().join("folder.jpg")).unwrap();

    let mut names: Vec<String> = catalog
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.display_name)
        .collect();
    names.sort();

    assert_eq!(names, vec!["a.jpg", "b.JPEG", "c.png", "d.MP4", "e.mov"]);
}

#[tokio::test]
async fn test_list_reports_kinds() {
    let (temp_dir, _fs, catalog) = create_catalog();
    touch(&temp_dir, "clip.mov");
    touch(&temp_dir, "shot.png");

    let entries = catalog.list().await.unwrap();
    let clip = entries.iter().find(|e| e.display_name == "clip.mov").unwrap();
    let shot = entries.iter().find(|e| e.display_name == "shot.png").unwrap();

    assert_eq!(clip.kind, MediaKind::Video);
    assert_eq!(shot.kind, MediaKind::Photo);
}

#[tokio::test]
async fn test_list_read_failure() {
    let (_temp_dir, filesystem, catalog) = create_catalog();
    filesystem.set_fail_reads(true);

    assert!(matches!(
        catalog.list().await,
        Err(PocketcamError::FileSystem { .. })
    ));
}

#[tokio::test]
async fn test_list_missing_directory_is_empty() {
    let root = TempDir::new().unwrap();
    let catalog = MediaCatalog::new(
        root.path().join("media"),
        Arc::new(crate::storage::LocalFilesystem::new()),
        event_bus(),
    );

    assert!(catalog.list().await.unwrap().is_empty());
    assert!(!root.path().join("media").exists());
}

#[tokio::test]
async fn test_rename_moves_file() {
    let (temp_dir, _fs, catalog) = create_catalog();
    let original = touch(&temp_dir, "capture_1.jpg");

    let entry = catalog.rename(&original, "beach.jpg").await.unwrap();

    assert_eq!(entry.display_name, "beach.jpg");
    assert_eq!(entry.path, temp_dir.path().join("beach.jpg"));
    assert_eq!(file_names(temp_dir.path()), vec!["beach.jpg"]);
}

#[tokio::test]
async fn test_rename_rejects_collision() {
    let (temp_dir, _fs, catalog) = create_catalog();
    let original = touch(&temp_dir, "one.jpg");
    touch(&temp_dir, "two.jpg");

    let result = catalog.rename(&original, "two.jpg").await;

    assert!(matches!(result, Err(PocketcamError::NameCollision { .. })));
    assert_eq!(file_names(temp_dir.path()), vec!["one.jpg", "two.jpg"]);
}

#[tokio::test]
async fn test_rename_failure_leaves_catalog_unchanged() {
    let (temp_dir, filesystem, catalog) = create_catalog();
    let original = touch(&temp_dir, "one.jpg");
    filesystem.set_fail_moves(true);

    let result = catalog.rename(&original, "renamed.jpg").await;

    assert!(matches!(result, Err(PocketcamError::FileSystem { .. })));
    assert_eq!(file_names(temp_dir.path()), vec!["one.jpg"]);
}

#[tokio::test]
async fn test_rename_accepts_bare_file_name() {
    let (temp_dir, _fs, catalog) = create_catalog();
    touch(&temp_dir, "clip.mp4");

    let entry = catalog
        .apply_rename(&RenameRequest::new("clip.mp4", "party.mov"))
        .await
        .unwrap();

    assert!(entry.is_video());
    assert_eq!(file_names(temp_dir.path()), vec!["party.mov"]);
}

#[tokio::test]
async fn test_remove_deletes_file_and_publishes() {
    let (temp_dir, _fs, catalog) = create_catalog();
    let path = touch(&temp_dir, "old.png");
    let bus = event_bus();
    let catalog = MediaCatalog::new(
        temp_dir.path(),
        Arc::new(crate::storage::LocalFilesystem::new()),
        Arc::clone(&bus),
    );
    let mut removals = bus.subscribe_filtered(EventFilter::EventTypes(vec!["entry_removed"]), "test");

    catalog.remove(&path).await.unwrap();

    assert!(catalog.list().await.unwrap().is_empty());
    match removals.try_recv().unwrap() {
        Some(MediaEvent::EntryRemoved { path: removed }) => assert_eq!(removed, path),
        other => panic!("Expected removal event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_remove_failure_leaves_catalog_unchanged() {
    let (temp_dir, filesystem, catalog) = create_catalog();
    let path = touch(&temp_dir, "keep.jpg");
    filesystem.set_fail_removes(true);

    assert!(matches!(
        catalog.remove(&path).await,
        Err(PocketcamError::FileSystem { .. })
    ));
    assert_eq!(catalog.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_paths_outside_catalog_are_rejected() {
    let (_temp_dir, _fs, catalog) = create_catalog();
    let elsewhere = TempDir::new().unwrap();
    let outside = touch(&elsewhere, "secret.jpg");

    assert!(catalog.remove(&outside).await.is_err());
    assert!(outside.exists());
}

#[tokio::test]
async fn test_equivalent_spellings_of_catalog_dir_are_members() {
    let (temp_dir, _fs, catalog) = create_catalog();
    let dotted = touch(&temp_dir, "a.jpg");
    let dotted = dotted.parent().unwrap().join(".").join("a.jpg");
    touch(&temp_dir, "b.jpg");
    let detour = temp_dir.path().join("sub").join("..").join("b.jpg");

    catalog.remove(&dotted).await.unwrap();
    let entry = catalog.rename(&detour, "c.jpg").await.unwrap();

    assert_eq!(entry.path, temp_dir.path().join("c.jpg"));
    assert_eq!(file_names(temp_dir.path()), vec!["c.jpg"]);
}

#[test]
fn test_lexical_absolute_anchors_relative_paths() {
    let cwd = std::env::current_dir().unwrap();

    assert_eq!(lexical_absolute(Path::new("./media")), cwd.join("media"));
    assert_eq!(
        lexical_absolute(Path::new("/var/./media/../media")),
        PathBuf::from("/var/media")
    );
}

#[tokio::test]
async fn test_import_creates_directory_and_moves_file() {
    let root = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let catalog_dir = root.path().join("media");
    let catalog = MediaCatalog::new(
        &catalog_dir,
        Arc::new(crate::storage::LocalFilesystem::new()),
        event_bus(),
    );
    let source = touch(&staging, "tmp-123.jpg");

    let entry = catalog.import(&source, "capture_x.jpg").await.unwrap();

    assert_eq!(entry.path, catalog_dir.join("capture_x.jpg"));
    assert!(!source.exists());
    assert_eq!(file_names(&catalog_dir), vec!["capture_x.jpg"]);
}
