use crate::error::IngestError;
use crate::timestamp::{ms_to_timestamp, timestamp_to_ms};

/// Timing, text and confidence for one word inside a segment.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct WordSpan {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
    pub score: f64,
}

/// Payload of one node in the track.
///
/// `identity` carries no meaning about the content. It is regenerated
/// whenever the row (or a neighbour it depends on) needs to be redrawn, so
/// renderers can key rows on it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct Segment {
    pub identity: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
    pub score: f64,
    pub words: Vec<WordSpan>,
    pub edit_mode: bool,
}

// ── Wire formats ─────────────────────────────────────────────────────────────

/// A time value as it appears in ingested JSON: raw milliseconds, or a
/// display timestamp when re-loading a previously exported flat view.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub enum RecordTime {
    Ms(f64),
    Display(String),
}

impl RecordTime {
    pub fn to_ms(&self) -> Result<i64, IngestError> {
        match self {
            // 2^63 is the first value `as i64` would saturate instead of convert.
            Self::Ms(ms) if ms.is_finite() && ms.round().abs() < 9_223_372_036_854_775_808.0 => {
                Ok(ms.round() as i64)
            }
            Self::Ms(ms) => Err(IngestError::InvalidTimestamp(ms.to_string())),
            Self::Display(s) => timestamp_to_ms(s),
        }
    }
}

impl From<i64> for RecordTime {
    fn from(ms: i64) -> Self {
        Self::Ms(ms as f64)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct WordRecord {
    pub start: RecordTime,
    pub end: RecordTime,
    pub text: String,
    pub score: f64,
}

/// One externally supplied segment, as consumed at load time.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct SegmentRecord {
    pub score: f64,
    pub start: RecordTime,
    pub end: RecordTime,
    pub text: String,
    #[serde(default)]
    pub words: Vec<WordRecord>,
}

/// A word as it appears in the flat view.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct FlatWord {
    pub start: String,
    pub end: String,
    pub text: String,
    pub score: f64,
}

/// A segment as it appears in the flat view: the shape handed to
/// persistence, export and playback cue lookup.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct FlatSegment {
    pub score: f64,
    pub start: String,
    pub end: String,
    pub text: String,
    pub words: Vec<FlatWord>,
}

impl From<&WordSpan> for FlatWord {
    fn from(w: &WordSpan) -> Self {
        Self {
            start: ms_to_timestamp(w.start_ms),
            end: ms_to_timestamp(w.end_ms),
            text: w.text.clone(),
            score: w.score,
        }
    }
}

impl From<&Segment> for FlatSegment {
    fn from(s: &Segment) -> Self {
        Self {
            score: s.score,
            start: ms_to_timestamp(s.start_ms),
            end: ms_to_timestamp(s.end_ms),
            text: s.text.clone(),
            words: s.words.iter().map(FlatWord::from).collect(),
        }
    }
}

impl From<&FlatWord> for WordRecord {
    fn from(w: &FlatWord) -> Self {
        Self {
            start: RecordTime::Display(w.start.clone()),
            end: RecordTime::Display(w.end.clone()),
            text: w.text.clone(),
            score: w.score,
        }
    }
}

impl From<&FlatSegment> for SegmentRecord {
    fn from(s: &FlatSegment) -> Self {
        Self {
            score: s.score,
            start: RecordTime::Display(s.start.clone()),
            end: RecordTime::Display(s.end.clone()),
            text: s.text.clone(),
            words: s.words.iter().map(WordRecord::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_numbers_and_timestamps() {
        let json = r#"[
            {"score": 0.9, "start": 0, "end": 1500.4, "text": "a"},
            {"score": 0.8, "start": "00:00:01.500", "end": "00:00:02.000", "text": "b",
             "words": [{"start": 1500, "end": 2000, "text": "b", "score": 0.8}]}
        ]"#;
        let records: Vec<SegmentRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].end.to_ms().unwrap(), 1500);
        assert!(records[0].words.is_empty());
        assert_eq!(records[1].start.to_ms().unwrap(), 1500);
        assert_eq!(records[1].words[0].end.to_ms().unwrap(), 2000);
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        for ms in [1e19, -1e19, f64::INFINITY, f64::NAN] {
            assert!(
                matches!(RecordTime::Ms(ms).to_ms(), Err(IngestError::InvalidTimestamp(_))),
                "{ms} should be rejected"
            );
        }
        assert_eq!(RecordTime::Ms(-500.0).to_ms().unwrap(), -500);
    }

    #[test]
    fn record_missing_field_fails() {
        let json = r#"[{"score": 0.9, "start": 0, "text": "a"}]"#;
        assert!(serde_json::from_str::<Vec<SegmentRecord>>(json).is_err());
    }

    #[test]
    fn flat_segment_renders_display_timestamps() {
        let segment = Segment {
            identity: "x".into(),
            start_ms: 1_000,
            end_ms: 2_250,
            text: " hello".into(),
            score: 0.5,
            words: vec![WordSpan {
                start_ms: 1_000,
                end_ms: 1_400,
                text: " hello".into(),
                score: 0.5,
            }],
            edit_mode: false,
        };
        let flat = FlatSegment::from(&segment);
        assert_eq!(flat.start, "00:00:01.000");
        assert_eq!(flat.end, "00:00:02.250");
        assert_eq!(flat.words[0].end, "00:00:01.400");
    }
}
