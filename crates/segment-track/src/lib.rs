pub mod config;
pub mod error;
pub mod export;
pub mod id;
pub mod ingest;
pub mod session;
pub mod sync;
pub mod timestamp;
pub mod track;
pub mod types;

pub use config::SyncConfig;
pub use error::{Error, IngestError, TrackError};
pub use id::{IdGenerator, SequentialIdGen, UuidIdGen};
pub use ingest::{build_track, parse_records};
pub use session::Session;
pub use sync::{SyncUpdate, Touched, TrackListener, TrackSynchronizer};
pub use timestamp::{ms_to_timestamp, timestamp_to_ms};
pub use track::{NodeId, SegmentNode, SegmentTrack};
pub use types::{FlatSegment, FlatWord, RecordTime, Segment, SegmentRecord, WordRecord, WordSpan};
