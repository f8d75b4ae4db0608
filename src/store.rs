use crate::eid::Eid;
use crate::videos::{Category, Video};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

/// A single mutation inside an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    PutCategory(Category),
    PutVideo(Video),
    DeleteCategory(String),
    DeleteVideo(String),
}

/// The document store of record. Reads are scoped to an owner; writes go
/// through `batch_write`, which applies the whole list atomically: either
/// every op lands or none does.
pub trait DocumentStore: Send + Sync {
    fn categories_by_owner(&self, user_id: &str) -> anyhow::Result<Vec<Category>>;
    fn videos_by_owner(&self, user_id: &str) -> anyhow::Result<Vec<Video>>;
    fn batch_write(&self, ops: Vec<WriteOp>) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collections {
    categories: Vec<Category>,
    videos: Vec<Video>,
}

/// JSON-file backend. The whole collection set lives in one document that is
/// rewritten via temp-file-then-rename, so a crashed write never leaves a
/// torn file behind.
#[derive(Clone)]
pub struct BackendJson {
    state: Arc<RwLock<Collections>>,
    path: PathBuf,
}

impl BackendJson {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let state = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("{} is malformed", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("creating new collection database at {}", path.display());
                Collections::default()
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("couldn't read {}", path.display()))
            }
        };

        let backend = BackendJson {
            state: Arc::new(RwLock::new(state)),
            path: path.to_path_buf(),
        };
        backend.persist(&backend.state.read().unwrap())?;

        Ok(backend)
    }

    fn persist(&self, state: &Collections) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("couldn't create {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension(format!("{}.tmp", Eid::new()));
        let bytes = serde_json::to_vec_pretty(state).context("couldn't serialize collections")?;

        std::fs::write(&temp_path, bytes)
            .with_context(|| format!("couldn't write {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("couldn't replace {}", self.path.display()))?;

        Ok(())
    }

    fn apply(state: &mut Collections, op: WriteOp) {
        match op {
            WriteOp::PutCategory(category) => {
                match state.categories.iter_mut().find(|c| c.id == category.id) {
                    Some(existing) => *existing = category,
                    None => state.categories.push(category),
                }
            }
            WriteOp::PutVideo(video) => {
                match state.videos.iter_mut().find(|v| v.id == video.id) {
                    Some(existing) => *existing = video,
                    None => state.videos.push(video),
                }
            }
            WriteOp::DeleteCategory(id) => {
                state.categories.retain(|c| c.id != id);
            }
            WriteOp::DeleteVideo(id) => {
                state.videos.retain(|v| v.id != id);
            }
        }
    }
}

impl DocumentStore for BackendJson {
    fn categories_by_owner(&self, user_id: &str) -> anyhow::Result<Vec<Category>> {
        let state = self.state.read().unwrap();
        Ok(state
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    fn videos_by_owner(&self, user_id: &str) -> anyhow::Result<Vec<Video>> {
        let state = self.state.read().unwrap();
        Ok(state
            .videos
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    fn batch_write(&self, ops: Vec<WriteOp>) -> anyhow::Result<()> {
        let mut state = self.state.write().unwrap();

        // Apply against a scratch copy, persist, and only then swap the
        // in-memory state. A failed persist leaves both file and memory
        // at the pre-batch snapshot.
        let mut next = state.clone();
        let count = ops.len();
        for op in ops {
            Self::apply(&mut next, op);
        }

        self.persist(&next)?;
        *state = next;

        log::debug!("committed batch of {count} ops");

        Ok(())
    }
}
