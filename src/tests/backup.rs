use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backup::{self, BackupError, UNCATEGORIZED};
use crate::store::{BackendJson, DocumentStore, WriteOp};
use crate::tests::app::create_app;
use crate::videos::{Category, CategoryCreate, SearchQuery, Video, VideoCreate};

/// Store wrapper that fails the Nth batch_write, for exercising
/// phase-atomicity behavior.
struct FailingStore {
    inner: BackendJson,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingStore {
    fn new(inner: BackendJson, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DocumentStore for FailingStore {
    fn categories_by_owner(&self, user_id: &str) -> anyhow::Result<Vec<Category>> {
        self.inner.categories_by_owner(user_id)
    }

    fn videos_by_owner(&self, user_id: &str) -> anyhow::Result<Vec<Video>> {
        self.inner.videos_by_owner(user_id)
    }

    fn batch_write(&self, ops: Vec<WriteOp>) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            anyhow::bail!("simulated write failure");
        }
        self.inner.batch_write(ops)
    }
}

fn sample_backup_json() -> &'static str {
    r#"{
  "categories": [
    { "name": "Comedy", "emoji": "😂", "color": "bg-red-500" }
  ],
  "videos": [
    {
      "title": "clip",
      "thumbnailUrl": "https://x/y.jpg",
      "platform": "youtube",
      "duration": "0:30",
      "isFavorite": false,
      "originalUrl": "https://youtube.com/watch?v=1",
      "categoryName": "Comedy"
    }
  ]
}"#
}

#[test]
fn test_concrete_restore_scenario() {
    let (app, _tmp) = create_app();

    let summary = app.import_backup(sample_backup_json(), |_| {}).unwrap();
    assert_eq!(summary.categories_restored, 1);
    assert_eq!(summary.videos_restored, 1);

    let categories = app.list_categories().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Comedy");
    assert_eq!(categories[0].user_id, "local");

    let videos = app.search(SearchQuery::default()).unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].user_id, "local");
    // the restored reference points at the newly assigned category id
    assert_eq!(videos[0].category_id, categories[0].id);
    assert!(!videos[0].date_added.is_empty());
}

#[test]
fn test_export_import_round_trip() {
    let (source, _tmp) = create_app();

    let comedy = source
        .create_category(CategoryCreate {
            name: "Comedy".to_string(),
            emoji: "😂".to_string(),
            color: "bg-red-500".to_string(),
        })
        .unwrap();
    let music = source
        .create_category(CategoryCreate {
            name: "Music".to_string(),
            emoji: "🎵".to_string(),
            color: "bg-purple-500".to_string(),
        })
        .unwrap();

    for (n, category) in [(0, &comedy), (1, &music), (2, &comedy)] {
        source
            .create_video(
                VideoCreate {
                    url: format!("https://youtu.be/video{n:06}"),
                    title: Some(format!("clip {n}")),
                    category_id: Some(category.id.clone()),
                    ..Default::default()
                },
                true,
            )
            .unwrap();
    }

    let (_file_name, json) = source.export_backup().unwrap();

    // restore into a fresh empty collection
    let (target, _tmp2) = create_app();
    let summary = target.import_backup(&json, |_| {}).unwrap();
    assert_eq!(summary.categories_restored, 2);
    assert_eq!(summary.videos_restored, 3);

    // every video's category assignment matches its pre-export category by
    // name, not by the now-stale id
    let categories = target.list_categories().unwrap();
    let restored_comedy = categories.iter().find(|c| c.name == "Comedy").unwrap();
    let restored_music = categories.iter().find(|c| c.name == "Music").unwrap();
    assert_ne!(restored_comedy.id, comedy.id);

    let videos = target.search(SearchQuery::default()).unwrap();
    assert_eq!(videos.len(), 3);
    for video in &videos {
        let expected = if video.title == "clip 1" {
            &restored_music.id
        } else {
            &restored_comedy.id
        };
        assert_eq!(&video.category_id, expected);
    }
}

#[test]
fn test_uncategorized_round_trip() {
    let (source, _tmp) = create_app();

    let category = source
        .create_category(CategoryCreate {
            name: "Temp".to_string(),
            emoji: "🕐".to_string(),
            color: "bg-gray-500".to_string(),
        })
        .unwrap();
    source
        .create_video(
            VideoCreate {
                url: "https://example.com/orphan".to_string(),
                title: Some("orphan".to_string()),
                category_id: Some(category.id.clone()),
                ..Default::default()
            },
            true,
        )
        .unwrap();

    // delete the category before exporting; the video's reference dangles
    source.delete_category(&category.id).unwrap();

    let (_name, json) = source.export_backup().unwrap();
    let doc = backup::parse(&json).unwrap();
    assert_eq!(doc.videos[0].category_name, UNCATEGORIZED);

    // the importer maps the sentinel to "no category" without fabricating one
    let (target, _tmp2) = create_app();
    let summary = target.import_backup(&json, |_| {}).unwrap();
    assert_eq!(summary.videos_restored, 1);
    assert!(target.list_categories().unwrap().is_empty());

    let videos = target.search(SearchQuery::default()).unwrap();
    assert_eq!(videos[0].category_id, "");
}

#[test]
fn test_unknown_category_name_imports_as_no_category() {
    let (app, _tmp) = create_app();

    let json = r#"{
  "categories": [],
  "videos": [
    {
      "title": "clip",
      "thumbnailUrl": "",
      "platform": "other",
      "duration": "",
      "isFavorite": false,
      "originalUrl": "https://example.com/v",
      "categoryName": "Ghost Category"
    }
  ]
}"#;

    let summary = app.import_backup(json, |_| {}).unwrap();
    assert_eq!(summary.videos_restored, 1);
    assert!(app.list_categories().unwrap().is_empty());
    assert_eq!(app.search(SearchQuery::default()).unwrap()[0].category_id, "");
}

#[test]
fn test_import_replaces_existing_collection() {
    let (app, _tmp) = create_app();

    let stale = app
        .create_category(CategoryCreate {
            name: "Old".to_string(),
            emoji: "🗑".to_string(),
            color: "bg-gray-500".to_string(),
        })
        .unwrap();
    app.create_video(
        VideoCreate {
            url: "https://example.com/old".to_string(),
            title: Some("old clip".to_string()),
            ..Default::default()
        },
        true,
    )
    .unwrap();

    app.import_backup(sample_backup_json(), |_| {}).unwrap();

    let categories = app.list_categories().unwrap();
    assert_eq!(categories.len(), 1);
    assert_ne!(categories[0].id, stale.id);
    assert_eq!(categories[0].name, "Comedy");

    let videos = app.search(SearchQuery::default()).unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "clip");
}

#[test]
fn test_invalid_backup_aborts_before_any_mutation() {
    let (app, _tmp) = create_app();

    app.create_video(
        VideoCreate {
            url: "https://example.com/keep".to_string(),
            title: Some("keeper".to_string()),
            ..Default::default()
        },
        true,
    )
    .unwrap();

    let result = app.import_backup(r#"{"videos": []}"#, |_| {});
    assert!(matches!(
        result,
        Err(crate::app::AppError::Backup(BackupError::Validation(_)))
    ));

    // nothing was wiped
    let videos = app.search(SearchQuery::default()).unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "keeper");
}

#[test]
fn test_video_phase_failure_leaves_categories_committed() {
    let tmp = tempfile::tempdir().unwrap();
    let inner = BackendJson::load(&tmp.path().join("collection.json")).unwrap();

    // seed a record that the wipe phase will remove
    inner
        .batch_write(vec![WriteOp::PutVideo(Video {
            id: "stale".to_string(),
            user_id: "u1".to_string(),
            title: "stale".to_string(),
            ..Default::default()
        })])
        .unwrap();

    // batch 1 = wipe, batch 2 = categories, batch 3 = videos
    let store = Arc::new(FailingStore::new(inner.clone(), 3));

    let doc = backup::parse(sample_backup_json()).unwrap();
    let result = backup::import(store.as_ref(), "u1", &doc, |_| {});
    assert!(result.is_err());

    // categories committed, zero videos, no half-written video batch
    assert_eq!(inner.categories_by_owner("u1").unwrap().len(), 1);
    assert!(inner.videos_by_owner("u1").unwrap().is_empty());
}

#[test]
fn test_duplicate_category_names_last_write_wins() {
    let (app, _tmp) = create_app();

    let json = r#"{
  "categories": [
    { "name": "Comedy", "emoji": "🙂", "color": "bg-red-500" },
    { "name": "Comedy", "emoji": "😂", "color": "bg-yellow-500" }
  ],
  "videos": [
    {
      "title": "clip",
      "thumbnailUrl": "",
      "platform": "other",
      "duration": "",
      "isFavorite": false,
      "originalUrl": "https://example.com/v",
      "categoryName": "Comedy"
    }
  ]
}"#;

    let summary = app.import_backup(json, |_| {}).unwrap();
    assert_eq!(summary.categories_restored, 2);

    // the video resolves to the later duplicate
    let categories = app.list_categories().unwrap();
    let last = categories.iter().find(|c| c.emoji == "😂").unwrap();
    let videos = app.search(SearchQuery::default()).unwrap();
    assert_eq!(videos[0].category_id, last.id);
}

#[test]
fn test_progress_reporting() {
    let (app, _tmp) = create_app();

    let mut reported: Vec<u8> = Vec::new();
    app.import_backup(sample_backup_json(), |pct| reported.push(pct))
        .unwrap();

    assert_eq!(reported, vec![10, 40, 100]);
}

#[test]
fn test_progress_proportional_per_video() {
    let (app, _tmp) = create_app();

    let video = r#"{
      "title": "clip",
      "thumbnailUrl": "",
      "platform": "other",
      "duration": "",
      "isFavorite": false,
      "originalUrl": "https://example.com/v",
      "categoryName": "Uncategorized"
    }"#;
    let json = format!(
        r#"{{ "categories": [], "videos": [{video}, {video}, {video}] }}"#
    );

    let mut reported: Vec<u8> = Vec::new();
    app.import_backup(&json, |pct| reported.push(pct)).unwrap();

    assert_eq!(reported, vec![10, 40, 60, 80, 100]);
}

#[test]
fn test_empty_backup_restores_empty_collection() {
    let (app, _tmp) = create_app();

    app.create_video(
        VideoCreate {
            url: "https://example.com/old".to_string(),
            title: Some("old".to_string()),
            ..Default::default()
        },
        true,
    )
    .unwrap();

    let mut reported: Vec<u8> = Vec::new();
    let summary = app
        .import_backup(r#"{"categories": [], "videos": []}"#, |pct| {
            reported.push(pct)
        })
        .unwrap();

    assert_eq!(summary.categories_restored, 0);
    assert_eq!(summary.videos_restored, 0);
    assert!(app.search(SearchQuery::default()).unwrap().is_empty());
    assert_eq!(*reported.last().unwrap(), 100);
}
