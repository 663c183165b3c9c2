use crate::track::NodeId;

/// Structural contract violations. These indicate the caller used the track
/// incorrectly and must not be swallowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    #[error("track is empty")]
    Empty,
    #[error("node {0:?} belongs to a different track")]
    ForeignNode(NodeId),
    #[error("node {0:?} is no longer in the track")]
    StaleNode(NodeId),
    #[error("node {0:?} is the head or tail; use remove_front/remove_back")]
    NotInterior(NodeId),
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("transcript contains no segments")]
    Empty,
    #[error("segment {index} ends before it starts ({start} > {end})")]
    InvertedSegment { index: usize, start: i64, end: i64 },
    #[error("word {word} of segment {segment} ends before it starts ({start} > {end})")]
    InvertedWord {
        segment: usize,
        word: usize,
        start: i64,
        end: i64,
    },
    #[error("segment {index} has a negative time ({value}ms)")]
    NegativeSegmentTime { index: usize, value: i64 },
    #[error("word {word} of segment {segment} has a negative time ({value}ms)")]
    NegativeWordTime {
        segment: usize,
        word: usize,
        value: i64,
    },
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
