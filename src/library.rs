//! Persistent track index: a YAML file mapping track titles to their
//! intro/loop MP3 blobs and the delay between them, stored together under
//! the platform data directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const INDEX_FILE: &str = "index.yml";

/// Title length bounds, matched by the slash-command option constraints.
pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 15;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("No track named '{0}'")]
    NotFound(String),

    #[error("A track named '{0}' already exists")]
    DuplicateTitle(String),

    #[error("'{title}' would store its files under the same name as '{existing}'")]
    SlugCollision { title: String, existing: String },

    #[error("Invalid title '{0}': must be {TITLE_MIN}-{TITLE_MAX} characters with at least one letter or digit")]
    InvalidTitle(String),

    #[error("Could not determine the platform data directory")]
    NoDataDir,

    #[error("Track storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Track index is malformed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One uploaded track set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEntry {
    /// Played once when playback starts.
    pub intro: PathBuf,
    /// Repeated forever after the intro (and delay) finish.
    #[serde(rename = "loop")]
    pub loop_file: PathBuf,
    /// Silence between the end of the intro and the first loop pass.
    #[serde(with = "humantime_serde", default)]
    pub delay: Duration,
}

type Index = BTreeMap<String, TrackEntry>;

/// The on-disk track store. Cheap to clone; all clones share the index.
#[derive(Clone)]
pub struct TrackLibrary {
    dir: PathBuf,
    index: Arc<Mutex<Index>>,
}

pub fn default_data_dir() -> Result<PathBuf, LibraryError> {
    let dir = dirs::data_dir().ok_or(LibraryError::NoDataDir)?;
    Ok(dir.join("soundtrack"))
}

/// Filesystem-safe name for a title: lowercased, runs of anything
/// non-alphanumeric collapsed to a single `-`.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut dash_pending = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if dash_pending && !out.is_empty() {
                out.push('-');
            }
            dash_pending = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            dash_pending = true;
        }
    }
    out
}

/// Existing title whose blobs live under the same slug as `title`, if any.
/// Blob filenames are keyed by slug, so two titles sharing a slug would
/// overwrite each other's files.
fn slug_collision(index: &Index, title: &str, exclude: Option<&str>) -> Option<String> {
    let candidate = slug(title);
    index
        .keys()
        .find(|existing| Some(existing.as_str()) != exclude && slug(existing) == candidate)
        .cloned()
}

fn validate_title(title: &str) -> Result<(), LibraryError> {
    let len = title.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) || slug(title).is_empty() {
        return Err(LibraryError::InvalidTitle(title.to_owned()));
    }
    Ok(())
}

impl TrackLibrary {
    /// Open the library rooted at `dir`, creating it on first run.
    pub fn open(dir: PathBuf) -> Result<Self, LibraryError> {
        fs::create_dir_all(&dir)?;

        let index_path = dir.join(INDEX_FILE);
        let index: Index = if index_path.exists() {
            serde_yaml::from_str(&fs::read_to_string(&index_path)?)?
        } else {
            Index::new()
        };

        debug!("Opened track library at {}", dir.display());
        Ok(Self {
            dir,
            index: Arc::new(Mutex::new(index)),
        })
    }

    pub async fn len(&self) -> usize {
        self.index.lock().await.len()
    }

    pub async fn entry(&self, title: &str) -> Option<TrackEntry> {
        self.index.lock().await.get(title).cloned()
    }

    /// All titles with their entries, sorted by title.
    pub async fn entries(&self) -> Vec<(String, TrackEntry)> {
        self.index
            .lock()
            .await
            .iter()
            .map(|(t, e)| (t.clone(), e.clone()))
            .collect()
    }

    /// Titles whose lowercased form starts with the lowercased `partial`,
    /// for slash-command autocompletion.
    pub async fn titles_matching(&self, partial: &str) -> Vec<String> {
        let partial = partial.to_lowercase();
        self.index
            .lock()
            .await
            .keys()
            .filter(|title| title.to_lowercase().starts_with(&partial))
            .cloned()
            .collect()
    }

    /// Store a new track set: both blobs are written before the index entry
    /// is persisted, so the index never points at files that do not exist.
    pub async fn add(
        &self,
        title: &str,
        intro_bytes: &[u8],
        loop_bytes: &[u8],
        delay: Duration,
    ) -> Result<TrackEntry, LibraryError> {
        validate_title(title)?;

        let mut index = self.index.lock().await;
        if index.contains_key(title) {
            return Err(LibraryError::DuplicateTitle(title.to_owned()));
        }
        if let Some(existing) = slug_collision(&index, title, None) {
            return Err(LibraryError::SlugCollision {
                title: title.to_owned(),
                existing,
            });
        }

        let (intro, loop_file) = self.blob_paths(title);
        fs::write(&intro, intro_bytes)?;
        if let Err(e) = fs::write(&loop_file, loop_bytes) {
            let _ = fs::remove_file(&intro);
            return Err(e.into());
        }

        let entry = TrackEntry {
            intro: intro.clone(),
            loop_file: loop_file.clone(),
            delay,
        };
        index.insert(title.to_owned(), entry.clone());

        if let Err(e) = self.persist(&index) {
            index.remove(title);
            let _ = fs::remove_file(&intro);
            let _ = fs::remove_file(&loop_file);
            return Err(e);
        }

        Ok(entry)
    }

    /// Re-key a track and move its blobs to the new slug.
    pub async fn rename(&self, old: &str, new: &str) -> Result<(), LibraryError> {
        validate_title(new)?;
        if old == new {
            return Ok(());
        }

        let mut index = self.index.lock().await;
        if index.contains_key(new) {
            return Err(LibraryError::DuplicateTitle(new.to_owned()));
        }
        // `old` itself is excluded: re-casing a title keeps its slug.
        if let Some(existing) = slug_collision(&index, new, Some(old)) {
            return Err(LibraryError::SlugCollision {
                title: new.to_owned(),
                existing,
            });
        }
        let mut entry = index
            .remove(old)
            .ok_or_else(|| LibraryError::NotFound(old.to_owned()))?;

        let (new_intro, new_loop) = self.blob_paths(new);
        let moved = fs::rename(&entry.intro, &new_intro)
            .and_then(|_| fs::rename(&entry.loop_file, &new_loop));
        if let Err(e) = moved {
            // Roll back: the old entry stays valid even if the intro
            // already moved.
            let _ = fs::rename(&new_intro, &entry.intro);
            index.insert(old.to_owned(), entry);
            return Err(e.into());
        }

        let old_paths = (entry.intro.clone(), entry.loop_file.clone());
        entry.intro = new_intro;
        entry.loop_file = new_loop;
        index.insert(new.to_owned(), entry);

        if let Err(e) = self.persist(&index) {
            // Move the blobs back so the still-persisted old entry keeps
            // pointing at real files.
            if let Some(mut entry) = index.remove(new) {
                let _ = fs::rename(&entry.intro, &old_paths.0);
                let _ = fs::rename(&entry.loop_file, &old_paths.1);
                entry.intro = old_paths.0;
                entry.loop_file = old_paths.1;
                index.insert(old.to_owned(), entry);
            }
            return Err(e);
        }

        Ok(())
    }

    /// Drop a track and its blobs. Blobs already missing from disk are
    /// logged and skipped.
    pub async fn remove(&self, title: &str) -> Result<(), LibraryError> {
        let mut index = self.index.lock().await;
        let entry = index
            .remove(title)
            .ok_or_else(|| LibraryError::NotFound(title.to_owned()))?;

        // Persist before touching the blobs: deletion cannot be rolled
        // back, so a failed index write must leave the track whole.
        if let Err(e) = self.persist(&index) {
            index.insert(title.to_owned(), entry);
            return Err(e);
        }

        for path in [&entry.intro, &entry.loop_file] {
            if let Err(e) = fs::remove_file(path) {
                warn!("Could not delete {}: {e}", path.display());
            }
        }

        Ok(())
    }

    fn blob_paths(&self, title: &str) -> (PathBuf, PathBuf) {
        let slug = slug(title);
        (
            self.dir.join(format!("{slug}_intro.mp3")),
            self.dir.join(format!("{slug}_loop.mp3")),
        )
    }

    /// Write the index via a temp file + rename so a crash mid-write cannot
    /// truncate it.
    fn persist(&self, index: &Index) -> Result<(), LibraryError> {
        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        fs::write(&tmp, serde_yaml::to_string(index)?)?;
        fs::rename(&tmp, self.dir.join(INDEX_FILE))?;
        Ok(())
    }
}
