use crate::{
    backup::{self, BackupError, RestoreSummary},
    config::Config,
    eid::Eid,
    metadata::{self, VideoMeta},
    scrape::PageMeta,
    store::{DocumentStore, WriteOp},
    videos::{
        self, Category, CategoryCreate, CategoryUpdate, SearchQuery, Video, VideoCreate,
        VideoUpdate,
    },
};
use std::sync::{Arc, RwLock};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("video not found")]
    VideoNotFound,

    #[error("category not found")]
    CategoryNotFound,

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}

/// Application service: every operation the CLI and the daemon expose goes
/// through here. Reads and writes are scoped to the configured owner.
pub struct App {
    store: Arc<dyn DocumentStore>,
    config: Arc<RwLock<Config>>,
}

impl App {
    pub fn new(store: Arc<dyn DocumentStore>, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }

    fn user(&self) -> String {
        self.config.read().unwrap().user.clone()
    }

    fn config_snapshot(&self) -> Config {
        self.config.read().unwrap().clone()
    }

    /// oEmbed-preferring metadata resolution for a pasted url.
    pub fn fetch_meta(&self, url: &str) -> Option<VideoMeta> {
        let config = self.config_snapshot();
        metadata::resolve_video(url, &config)
    }

    /// Direct page scrape, bypassing the aggregator. Never fails.
    pub fn scrape_meta(&self, url: &str) -> PageMeta {
        let config = self.config_snapshot();
        metadata::resolve_page(url, &config)
    }

    fn find_category(&self, id: &str) -> Result<Category, AppError> {
        self.store
            .categories_by_owner(&self.user())?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(AppError::CategoryNotFound)
    }

    fn find_video(&self, id: &str) -> Result<Video, AppError> {
        self.store
            .videos_by_owner(&self.user())?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or(AppError::VideoNotFound)
    }

    /// Save a video link. Missing title/thumbnail/duration are resolved
    /// best-effort unless `no_meta` is set; resolution failure is not an
    /// error; the record is created with whatever the user supplied.
    pub fn create_video(&self, create: VideoCreate, no_meta: bool) -> Result<Video, AppError> {
        let mut title = create.title;
        let mut thumbnail_url = create.thumbnail_url;
        let mut duration = create.duration;

        if !no_meta && (title.is_none() || thumbnail_url.is_none() || duration.is_none()) {
            if let Some(meta) = self.fetch_meta(&create.url) {
                if title.is_none() {
                    title = Some(meta.title);
                }
                if thumbnail_url.is_none() {
                    thumbnail_url = meta.thumbnail;
                }
                if duration.is_none() {
                    duration = meta.duration;
                }
            }
        }

        let category_id = match create.category_id {
            Some(id) if !id.is_empty() => {
                self.find_category(&id)?;
                id
            }
            _ => String::new(),
        };

        let video = Video {
            id: Eid::new().to_string(),
            user_id: self.user(),
            title: title.unwrap_or_else(|| create.url.clone()),
            thumbnail_url: thumbnail_url.unwrap_or_default(),
            platform: videos::detect_platform(&create.url).to_string(),
            duration: duration.unwrap_or_default(),
            category_id,
            notes: create.notes,
            is_favorite: create.is_favorite,
            date_added: chrono::Utc::now().to_rfc3339(),
            original_url: create.url,
        };

        self.store
            .batch_write(vec![WriteOp::PutVideo(video.clone())])?;

        Ok(video)
    }

    /// Newest-first listing, filtered by the query.
    pub fn search(&self, query: SearchQuery) -> Result<Vec<Video>, AppError> {
        let owned = self.store.videos_by_owner(&self.user())?;

        // return all
        let mut matches: Vec<Video> = if query.is_empty() {
            owned
        } else {
            owned.into_iter().filter(|v| query.matches(v)).collect()
        };

        // ULIDs sort by allocation time, so id order is insertion order.
        matches.sort_by(|a, b| b.id.cmp(&a.id));

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }

        Ok(matches)
    }

    pub fn update_video(&self, id: &str, update: VideoUpdate) -> Result<Video, AppError> {
        let mut video = self.find_video(id)?;

        if let Some(title) = update.title {
            video.title = title;
        }
        if let Some(thumbnail_url) = update.thumbnail_url {
            video.thumbnail_url = thumbnail_url;
        }
        if let Some(duration) = update.duration {
            video.duration = duration;
        }
        if let Some(category_id) = update.category_id {
            if !category_id.is_empty() {
                self.find_category(&category_id)?;
            }
            video.category_id = category_id;
        }
        if let Some(notes) = update.notes {
            video.notes = Some(notes);
        }
        if let Some(is_favorite) = update.is_favorite {
            video.is_favorite = is_favorite;
        }

        self.store
            .batch_write(vec![WriteOp::PutVideo(video.clone())])?;

        Ok(video)
    }

    pub fn toggle_favorite(&self, id: &str) -> Result<Video, AppError> {
        let mut video = self.find_video(id)?;
        video.is_favorite = !video.is_favorite;

        self.store
            .batch_write(vec![WriteOp::PutVideo(video.clone())])?;

        Ok(video)
    }

    /// Bulk delete. Ids that don't resolve to an owned video are skipped;
    /// the deletes commit as one batch.
    pub fn delete_videos(&self, ids: &[String]) -> Result<usize, AppError> {
        let owned = self.store.videos_by_owner(&self.user())?;

        let ops: Vec<WriteOp> = owned
            .iter()
            .filter(|v| ids.contains(&v.id))
            .map(|v| WriteOp::DeleteVideo(v.id.clone()))
            .collect();

        let count = ops.len();
        if count > 0 {
            self.store.batch_write(ops)?;
        }

        Ok(count)
    }

    /// Bulk move to a category (or to "uncategorized" with `None`), committed
    /// as one batch.
    pub fn move_videos(
        &self,
        ids: &[String],
        category_id: Option<&str>,
    ) -> Result<usize, AppError> {
        let target = match category_id {
            Some(id) if !id.is_empty() => {
                self.find_category(id)?;
                id.to_string()
            }
            _ => String::new(),
        };

        let owned = self.store.videos_by_owner(&self.user())?;

        let ops: Vec<WriteOp> = owned
            .into_iter()
            .filter(|v| ids.contains(&v.id))
            .map(|mut v| {
                v.category_id = target.clone();
                WriteOp::PutVideo(v)
            })
            .collect();

        let count = ops.len();
        if count > 0 {
            self.store.batch_write(ops)?;
        }

        Ok(count)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories = self.store.categories_by_owner(&self.user())?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    pub fn create_category(&self, create: CategoryCreate) -> Result<Category, AppError> {
        let category = Category {
            id: Eid::new().to_string(),
            user_id: self.user(),
            name: create.name,
            emoji: create.emoji,
            color: create.color,
            is_locked: None,
            pin: None,
        };

        self.store
            .batch_write(vec![WriteOp::PutCategory(category.clone())])?;

        Ok(category)
    }

    pub fn update_category(&self, id: &str, update: CategoryUpdate) -> Result<Category, AppError> {
        let mut category = self.find_category(id)?;

        if let Some(name) = update.name {
            category.name = name;
        }
        if let Some(emoji) = update.emoji {
            category.emoji = emoji;
        }
        if let Some(color) = update.color {
            category.color = color;
        }

        self.store
            .batch_write(vec![WriteOp::PutCategory(category.clone())])?;

        Ok(category)
    }

    /// Delete a category. Its videos are left in place with a dangling
    /// reference, which reads everywhere as "uncategorized".
    pub fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let category = self.find_category(id)?;

        self.store
            .batch_write(vec![WriteOp::DeleteCategory(category.id)])?;

        Ok(())
    }

    /// PIN-gate a category. The pin is stored in plaintext and checked in
    /// the UI; this is a UX gate, not an authorization boundary.
    pub fn lock_category(&self, id: &str, pin: String) -> Result<Category, AppError> {
        let mut category = self.find_category(id)?;
        category.is_locked = Some(true);
        category.pin = Some(pin);

        self.store
            .batch_write(vec![WriteOp::PutCategory(category.clone())])?;

        Ok(category)
    }

    pub fn unlock_category(&self, id: &str) -> Result<Category, AppError> {
        let mut category = self.find_category(id)?;
        category.is_locked = None;
        category.pin = None;

        self.store
            .batch_write(vec![WriteOp::PutCategory(category.clone())])?;

        Ok(category)
    }

    /// Export the collection. Returns the dated file name and the serialized
    /// document.
    pub fn export_backup(&self) -> Result<(String, String), AppError> {
        let doc = backup::export(self.store.as_ref(), &self.user())?;
        let json = backup::to_json(&doc).map_err(AppError::Other)?;
        let file_name = backup::backup_file_name(&self.config.read().unwrap().backup_prefix);

        Ok((file_name, json))
    }

    /// Parse and restore a backup, replacing the whole collection. The
    /// caller confirms with the user before invoking this.
    pub fn import_backup(
        &self,
        json: &str,
        on_progress: impl FnMut(u8),
    ) -> Result<RestoreSummary, AppError> {
        let doc = backup::parse(json)?;
        let summary = backup::import(self.store.as_ref(), &self.user(), &doc, on_progress)?;

        Ok(summary)
    }
}
