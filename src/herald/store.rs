use crate::herald::model::{ChannelRecord, VideoSnapshot};
use crate::herald::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The persisted document: a channels table and a videos table, the
/// sheet-shaped state the run reads once and writes back incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldState {
    pub schema_version: u32,
    pub channels: Vec<ChannelRecord>,
    pub videos: Vec<VideoSnapshot>,
}

impl HeraldState {
    pub fn empty() -> Self {
        Self {
            schema_version: 1,
            channels: Vec::new(),
            videos: Vec::new(),
        }
    }
}

/// File-backed store. Loaded whole at run start for cheap membership checks;
/// every append/update persists immediately, under the single-writer guarantee
/// of the outer run lock.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    state: HeraldState,
}

impl StateFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                state: HeraldState::empty(),
            });
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let state: HeraldState = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(err) => {
                let backup_path = path.with_extension("json.corrupt");
                let _ = fs::write(&backup_path, &raw);
                warn::emit(WarnEvent {
                    code: "STATE_CORRUPT",
                    stage: "startup",
                    channel: "na",
                    video: "na",
                    reason: "json-parse-failed",
                    err: &format!("{err:#}"),
                });
                HeraldState::empty()
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    pub fn channels(&self) -> &[ChannelRecord] {
        &self.state.channels
    }

    pub fn videos(&self) -> &[VideoSnapshot] {
        &self.state.videos
    }

    pub fn find_video(&self, video_id: &str) -> Option<&VideoSnapshot> {
        self.state.videos.iter().find(|v| v.video_id == video_id)
    }

    /// Append a newly observed video row.
    pub fn append_video(&mut self, snapshot: VideoSnapshot) -> Result<()> {
        self.state.videos.push(snapshot);
        self.save()
    }

    /// Update an existing video row in place, located by id. A missing row is
    /// a data-shape anomaly (the caller just found it), reported as an error.
    pub fn update_video(&mut self, snapshot: VideoSnapshot) -> Result<()> {
        let row = self
            .state
            .videos
            .iter_mut()
            .find(|v| v.video_id == snapshot.video_id)
            .with_context(|| format!("video row {} disappeared from state", snapshot.video_id))?;
        *row = snapshot;
        self.save()
    }

    /// Update the cached icon cell for a channel row. Unknown channel ids are
    /// ignored; the channels table is managed outside this system.
    pub fn set_channel_icon(&mut self, channel_id: &str, icon_url: &str) -> Result<()> {
        let Some(row) = self
            .state
            .channels
            .iter_mut()
            .find(|c| c.channel_id == channel_id)
        else {
            return Ok(());
        };
        row.icon_url = Some(icon_url.to_string());
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, format!("{data}\n"))
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Create the state file skeleton if it does not exist yet.
    pub fn init(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        let store = Self {
            path: path.to_path_buf(),
            state: HeraldState::empty(),
        };
        store.save()?;
        Ok(true)
    }
}
