use std::path::Path;

use crate::config::SyncConfig;
use crate::error::Error;
use crate::id::{IdGenerator, UuidIdGen};
use crate::ingest::parse_records;
use crate::sync::{SyncUpdate, TrackSynchronizer};
use crate::track::SegmentTrack;

/// One editing session: a synchronizer plus the user-facing error list.
///
/// Loading never fails outright. A malformed or empty transcript is recorded
/// in [`Session::errors`] and the session continues with an empty track.
#[derive(Debug)]
pub struct Session {
    sync: TrackSynchronizer,
    errors: Vec<String>,
}

impl Session {
    pub fn load(json: &str) -> Self {
        Self::load_with(json, UuidIdGen, SyncConfig::default())
    }

    pub fn load_with(json: &str, id_gen: impl IdGenerator + 'static, config: SyncConfig) -> Self {
        let mut session = Self {
            sync: TrackSynchronizer::with_config(SegmentTrack::new(), id_gen, config),
            errors: Vec::new(),
        };
        session.reload(json);
        session
    }

    /// Read a transcript file. Only I/O failures are returned; ingest
    /// failures land in [`Session::errors`] as with [`Session::load_with`].
    pub fn open_with(
        path: impl AsRef<Path>,
        id_gen: impl IdGenerator + 'static,
        config: SyncConfig,
    ) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::load_with(&json, id_gen, config))
    }

    /// Replace the transcript. Returns the update on success; on failure the
    /// error is recorded and the track falls back to empty.
    pub fn reload(&mut self, json: &str) -> Option<SyncUpdate> {
        let loaded = parse_records(json).and_then(|records| self.sync.load_records(&records));

        match loaded {
            Ok(update) => Some(update),
            Err(e) => {
                tracing::warn!(error = %e, "transcript_ingest_failed");
                self.errors.push(e.to_string());
                self.sync.replace_track(SegmentTrack::new());
                None
            }
        }
    }

    pub fn sync(&self) -> &TrackSynchronizer {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut TrackSynchronizer {
        &mut self.sync
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn report_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}
