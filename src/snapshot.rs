//! Last-known-good catalog on disk.
//!
//! After every successful reload the pieces and content are written to
//! `catalog.json` in the cache directory. Offline mode starts from this
//! file so the "offline" banner sits over the last synced catalog rather
//! than the seed one.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::Result;
use crate::models::{Item, SiteContent};
use crate::state::CatalogState;

const SNAPSHOT_FILE: &str = "catalog.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub saved_at: DateTime<Utc>,
    pub items: Vec<Item>,
    pub content: SiteContent,
}

pub struct SnapshotCache {
    /// Directory holding the snapshot file.
    pub cache_dir: PathBuf,
}

impl SnapshotCache {
    /// Open (creating if needed) a cache directory. `None` uses the
    /// platform default.
    pub fn new(cache_dir: Option<PathBuf>) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { cache_dir: dir })
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    /// Persist the state's pieces and content.
    ///
    /// Writes to a temp file first and renames on success, so an
    /// interrupted write never leaves a truncated snapshot behind.
    pub fn save(&self, state: &CatalogState) -> Result<()> {
        let snapshot = Snapshot {
            saved_at: Utc::now(),
            items: state.items.clone(),
            content: state.content.clone(),
        };
        let dest = self.path();
        let tmp = dest.with_extension("json.tmp");

        let result = (|| -> Result<()> {
            fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
            fs::rename(&tmp, &dest)?;
            Ok(())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        debug!("Saved catalog snapshot with {} pieces", snapshot.items.len());
        result
    }

    /// Load the snapshot, if one exists and parses.
    ///
    /// A corrupt file is deleted so the next successful reload can
    /// replace it cleanly.
    pub fn load(&self) -> Option<Snapshot> {
        let path = self.path();
        let contents = read_if_exists(&path)?;
        match serde_json::from_str(&contents) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Corrupt snapshot {}: {} -- removing", path.display(), e);
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn read_if_exists(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Could not read snapshot {}: {}", path.display(), e);
            None
        }
    }
}
