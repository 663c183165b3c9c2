//! Conversion between raw millisecond offsets and the `HH:MM:SS.mmm` display
//! form used by the flat view and the subtitle exporters.

use crate::error::IngestError;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;

/// Render `ms` as `HH:MM:SS.mmm`. Negative offsets keep a leading `-` so the
/// rendering never hides track state.
pub fn ms_to_timestamp(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let ms = ms.unsigned_abs();
    let hours = ms / MS_PER_HOUR as u64;
    let minutes = (ms % MS_PER_HOUR as u64) / MS_PER_MINUTE as u64;
    let seconds = (ms % MS_PER_MINUTE as u64) / MS_PER_SECOND as u64;
    let millis = ms % MS_PER_SECOND as u64;
    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parse `HH:MM:SS.mmm` (or `MM:SS.mmm`, either decimal marker) back into
/// milliseconds. Signs and values past `i64::MAX` milliseconds are rejected.
pub fn timestamp_to_ms(input: &str) -> Result<i64, IngestError> {
    let invalid = || IngestError::InvalidTimestamp(input.to_string());
    let digits = |p: &str| -> Result<i64, IngestError> {
        if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        p.parse::<i64>().map_err(|_| invalid())
    };

    let (clock, fraction) = match input.trim().split_once(['.', ',']) {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (input.trim(), None),
    };

    let parts = clock.split(':').map(&digits).collect::<Result<Vec<_>, _>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(invalid()),
    };
    if !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return Err(invalid());
    }

    let millis = match fraction {
        None => 0,
        Some(f) if f.len() > 3 => return Err(invalid()),
        // "5" means 500ms, "05" means 50ms.
        Some(f) => digits(f)? * 10_i64.pow(3 - f.len() as u32),
    };

    hours
        .checked_mul(MS_PER_HOUR)
        .and_then(|ms| ms.checked_add(minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis))
        .ok_or_else(invalid)
}
