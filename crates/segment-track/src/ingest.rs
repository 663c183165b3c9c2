use crate::error::IngestError;
use crate::id::IdGenerator;
use crate::track::SegmentTrack;
use crate::types::{Segment, SegmentRecord, WordSpan};

/// Decode a JSON array of segment records.
pub fn parse_records(json: &str) -> Result<Vec<SegmentRecord>, IngestError> {
    Ok(serde_json::from_str(json)?)
}

/// Validate and convert one record. `index` is only used for error reporting.
pub fn record_to_segment(
    record: &SegmentRecord,
    index: usize,
    id_gen: &mut dyn IdGenerator,
) -> Result<Segment, IngestError> {
    let start_ms = record.start.to_ms()?;
    let end_ms = record.end.to_ms()?;
    if let Some(value) = [start_ms, end_ms].into_iter().find(|ms| *ms < 0) {
        return Err(IngestError::NegativeSegmentTime { index, value });
    }
    if start_ms > end_ms {
        return Err(IngestError::InvertedSegment {
            index,
            start: start_ms,
            end: end_ms,
        });
    }

    let words = record
        .words
        .iter()
        .enumerate()
        .map(|(word, w)| {
            let start = w.start.to_ms()?;
            let end = w.end.to_ms()?;
            if let Some(value) = [start, end].into_iter().find(|ms| *ms < 0) {
                return Err(IngestError::NegativeWordTime {
                    segment: index,
                    word,
                    value,
                });
            }
            if start > end {
                return Err(IngestError::InvertedWord {
                    segment: index,
                    word,
                    start,
                    end,
                });
            }
            Ok(WordSpan {
                start_ms: start,
                end_ms: end,
                text: w.text.clone(),
                score: w.score,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Segment {
        identity: id_gen.next_id(),
        start_ms,
        end_ms,
        text: record.text.clone(),
        score: record.score,
        words,
        edit_mode: false,
    })
}

/// Build a track from an ordered record list. The whole build fails on the
/// first malformed record; nothing is truncated.
pub fn build_track(
    records: &[SegmentRecord],
    id_gen: &mut dyn IdGenerator,
) -> Result<SegmentTrack, IngestError> {
    if records.is_empty() {
        return Err(IngestError::Empty);
    }

    let mut track = SegmentTrack::new();
    for (index, record) in records.iter().enumerate() {
        track.push_back(record_to_segment(record, index, id_gen)?);
    }

    tracing::debug!(segments = track.len(), "track_built");
    Ok(track)
}
