use crate::eid::Eid;
use crate::store::{DocumentStore, WriteOp};
use crate::videos::{Category, Video};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel category name written on export when a video's category
/// reference cannot be resolved (deleted category, empty reference).
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Portable backup file. Field names are the wire format: camelCase,
/// pretty-printed with 2-space indentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    pub categories: Vec<BackupCategory>,
    pub videos: Vec<BackupVideo>,
}

/// A category minus its store identity (`id`, `userId`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupCategory {
    pub name: String,
    pub emoji: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

/// A video minus `id`, `userId`, `dateAdded`, and `categoryId`; the category
/// reference travels by name instead, so it survives id regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupVideo {
    pub title: String,
    pub thumbnail_url: String,
    pub platform: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_favorite: bool,
    pub original_url: String,
    pub category_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreSummary {
    pub categories_restored: usize,
    pub videos_restored: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    #[error("invalid backup file: {0}")]
    Validation(String),

    #[error("{0}")]
    Store(#[from] anyhow::Error),
}

/// Name for an exported backup file, dated with the current local day.
pub fn backup_file_name(prefix: &str) -> String {
    format!("{}_backup_{}.json", prefix, chrono::Local::now().format("%Y-%m-%d"))
}

fn to_backup_category(category: &Category) -> BackupCategory {
    BackupCategory {
        name: category.name.clone(),
        emoji: category.emoji.clone(),
        color: category.color.clone(),
        is_locked: category.is_locked,
        pin: category.pin.clone(),
    }
}

fn to_backup_video(video: &Video, names_by_id: &HashMap<String, String>) -> BackupVideo {
    let category_name = names_by_id
        .get(&video.category_id)
        .cloned()
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    BackupVideo {
        title: video.title.clone(),
        thumbnail_url: video.thumbnail_url.clone(),
        platform: video.platform.clone(),
        duration: video.duration.clone(),
        notes: video.notes.clone(),
        is_favorite: video.is_favorite,
        original_url: video.original_url.clone(),
        category_name,
    }
}

/// Export the user's whole collection as a portable document. The category
/// and video reads are independent and run concurrently; any read error
/// aborts the export with nothing written.
pub fn export(store: &dyn DocumentStore, user_id: &str) -> anyhow::Result<BackupDocument> {
    let (categories, videos) = std::thread::scope(|s| {
        let categories = s.spawn(|| store.categories_by_owner(user_id));
        let videos = s.spawn(|| store.videos_by_owner(user_id));
        (categories.join(), videos.join())
    });

    let categories = categories.map_err(|_| anyhow::anyhow!("category reader panicked"))??;
    let videos = videos.map_err(|_| anyhow::anyhow!("video reader panicked"))??;

    let names_by_id: HashMap<String, String> = categories
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect();

    Ok(BackupDocument {
        categories: categories.iter().map(to_backup_category).collect(),
        videos: videos
            .iter()
            .map(|v| to_backup_video(v, &names_by_id))
            .collect(),
    })
}

/// Serialize a backup document to the wire format.
pub fn to_json(doc: &BackupDocument) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Parse and validate a backup file. The top level must be an object with
/// `categories` and `videos` arrays; anything else fails validation before
/// a single record is touched.
pub fn parse(json: &str) -> Result<BackupDocument, BackupError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| BackupError::Validation(format!("not valid JSON: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| BackupError::Validation("top level must be an object".to_string()))?;

    for key in ["categories", "videos"] {
        match obj.get(key) {
            None => {
                return Err(BackupError::Validation(format!("missing '{key}' array")));
            }
            Some(v) if !v.is_array() => {
                return Err(BackupError::Validation(format!("'{key}' must be an array")));
            }
            Some(_) => {}
        }
    }

    serde_json::from_value(value).map_err(|e| BackupError::Validation(e.to_string()))
}

/// Replace the user's entire collection with the backup's contents.
/// Destructive; callers confirm with the user first.
///
/// Runs as ordered phases (wipe, then categories, then videos), each committed
/// as one atomic batch. The phases together are NOT atomic: a failure
/// between commits leaves the earlier phases' state in place, and the
/// caller is expected to surface the error and let the user retry the whole
/// restore. `on_progress` receives rough percentages (10 after the wipe,
/// 40 after categories, then per-video up to 100).
pub fn import(
    store: &dyn DocumentStore,
    user_id: &str,
    doc: &BackupDocument,
    mut on_progress: impl FnMut(u8),
) -> Result<RestoreSummary, BackupError> {
    // Phase 1: wipe everything the user owns.
    let existing_categories = store.categories_by_owner(user_id)?;
    let existing_videos = store.videos_by_owner(user_id)?;

    let wipe_ops: Vec<WriteOp> = existing_categories
        .into_iter()
        .map(|c| WriteOp::DeleteCategory(c.id))
        .chain(existing_videos.into_iter().map(|v| WriteOp::DeleteVideo(v.id)))
        .collect();

    log::info!("restore: wiping {} existing records", wipe_ops.len());
    store.batch_write(wipe_ops)?;
    on_progress(10);

    // Phase 2: recreate categories under fresh ids, capturing name -> id.
    // Duplicate names collapse last-write-wins.
    let mut ids_by_name: HashMap<String, String> = HashMap::new();
    let mut category_ops = Vec::with_capacity(doc.categories.len());
    for backup_category in &doc.categories {
        let id = Eid::new().to_string();
        ids_by_name.insert(backup_category.name.clone(), id.clone());
        category_ops.push(WriteOp::PutCategory(Category {
            id,
            user_id: user_id.to_string(),
            name: backup_category.name.clone(),
            emoji: backup_category.emoji.clone(),
            color: backup_category.color.clone(),
            is_locked: backup_category.is_locked,
            pin: backup_category.pin.clone(),
        }));
    }

    let categories_restored = category_ops.len();
    store.batch_write(category_ops)?;
    on_progress(40);

    // Phase 3: recreate videos, re-resolving category references through the
    // fresh name map. Unknown names (including the sentinel) become an empty
    // reference, never a fabricated category. Original add timestamps are
    // not preserved.
    let date_added = chrono::Utc::now().to_rfc3339();
    let total = doc.videos.len();
    let mut video_ops = Vec::with_capacity(total);
    for (idx, backup_video) in doc.videos.iter().enumerate() {
        let category_id = ids_by_name
            .get(&backup_video.category_name)
            .cloned()
            .unwrap_or_default();

        video_ops.push(WriteOp::PutVideo(Video {
            id: Eid::new().to_string(),
            user_id: user_id.to_string(),
            title: backup_video.title.clone(),
            thumbnail_url: backup_video.thumbnail_url.clone(),
            platform: backup_video.platform.clone(),
            duration: backup_video.duration.clone(),
            category_id,
            notes: backup_video.notes.clone(),
            is_favorite: backup_video.is_favorite,
            date_added: date_added.clone(),
            original_url: backup_video.original_url.clone(),
        }));

        on_progress((40 + (idx + 1) * 60 / total) as u8);
    }

    let videos_restored = video_ops.len();
    store.batch_write(video_ops)?;
    if total == 0 {
        on_progress(100);
    }

    log::info!("restore: {categories_restored} categories, {videos_restored} videos");

    Ok(RestoreSummary {
        categories_restored,
        videos_restored,
    })
}
