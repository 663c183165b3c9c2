use std::str::FromStr;

use hypr_segment_track::{NodeId, Session, SyncUpdate};

/// One edit, addressed by the segment's current position in the track.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    AppendAfter(usize),
    AppendBefore(usize),
    Remove(usize),
    Toggle(usize),
    Text(usize, String),
    Time(usize, i64, i64),
}

impl FromStr for EditOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let kind = parts.next().unwrap_or_default();
        let index = parts
            .next()
            .ok_or_else(|| format!("missing segment index in {s:?}"))?
            .parse::<usize>()
            .map_err(|e| format!("bad segment index in {s:?}: {e}"))?;
        let rest = parts.next();

        match (kind, rest) {
            ("append-after", None) => Ok(Self::AppendAfter(index)),
            ("append-before", None) => Ok(Self::AppendBefore(index)),
            ("remove", None) => Ok(Self::Remove(index)),
            ("toggle", None) => Ok(Self::Toggle(index)),
            ("text", Some(text)) => Ok(Self::Text(index, text.to_string())),
            ("time", Some(range)) => {
                let (start, end) = range
                    .split_once(':')
                    .ok_or_else(|| format!("expected time:<index>:<start>:<end>, got {s:?}"))?;
                let start = start.parse().map_err(|e| format!("bad start in {s:?}: {e}"))?;
                let end = end.parse().map_err(|e| format!("bad end in {s:?}: {e}"))?;
                Ok(Self::Time(index, start, end))
            }
            _ => Err(format!("unknown edit {s:?}")),
        }
    }
}

impl EditOp {
    fn index(&self) -> usize {
        match self {
            Self::AppendAfter(i)
            | Self::AppendBefore(i)
            | Self::Remove(i)
            | Self::Toggle(i)
            | Self::Text(i, _)
            | Self::Time(i, _, _) => *i,
        }
    }
}

fn node_at(session: &Session, index: usize) -> Option<NodeId> {
    session
        .sync()
        .track()
        .iter()
        .nth(index)
        .map(|(id, _)| id)
}

/// Apply `ops` in order. Timestamp edits are clamped to the neighbours first.
pub fn apply(session: &mut Session, ops: &[EditOp]) -> Result<(), hypr_segment_track::Error> {
    for op in ops {
        let Some(node) = node_at(session, op.index()) else {
            tracing::warn!(op = ?op, "edit_index_out_of_range");
            session.report_error(format!("no segment at index {}", op.index()));
            continue;
        };

        let sync = session.sync_mut();
        let update: SyncUpdate = match op {
            EditOp::AppendAfter(_) => sync.append_after(node)?,
            EditOp::AppendBefore(_) => sync.append_before(node)?,
            EditOp::Remove(_) => sync.remove_segment(node)?,
            EditOp::Toggle(_) => sync.toggle_edit_mode(node)?,
            EditOp::Text(_, text) => sync.update_text(node, text.as_str())?,
            EditOp::Time(_, start, end) => {
                let (start, end) = sync.clamp_to_neighbors(node, *start, *end)?;
                sync.update_timestamps(node, start, end)?
            }
        };

        tracing::info!(
            op = ?op,
            revision = update.revision,
            redraw = update.touched.len(),
            "edit_applied"
        );
    }
    Ok(())
}
