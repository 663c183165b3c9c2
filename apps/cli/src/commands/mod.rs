pub mod edit;

use hypr_segment_track::{FlatSegment, Session, export, ms_to_timestamp};

#[derive(Clone, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ExportFormat {
    Json,
    Srt,
    Vtt,
}

pub fn render(segments: &[FlatSegment], format: &ExportFormat) -> anyhow::Result<String> {
    Ok(match format {
        ExportFormat::Json => export::to_json(segments)?,
        ExportFormat::Srt => export::to_srt(segments),
        ExportFormat::Vtt => export::to_vtt(segments),
    })
}

pub fn check(session: &Session) -> anyhow::Result<()> {
    if let Some(first) = session.errors().first() {
        for error in session.errors() {
            eprintln!("error: {error}");
        }
        anyhow::bail!("transcript failed to load: {first}");
    }

    let track = session.sync().track();
    let overlaps = track
        .iter()
        .zip(track.iter().skip(1))
        .filter(|((_, a), (_, b))| a.end_ms > b.start_ms)
        .count();

    println!("{} segments, {overlaps} overlapping boundaries", track.len());
    Ok(())
}

pub fn cue(session: &Session, at_ms: i64) -> anyhow::Result<()> {
    let sync = session.sync();
    match sync.track().segment_at(at_ms) {
        Some(node) => {
            let segment = sync.segment(node)?;
            println!(
                "[{} --> {}] {}",
                ms_to_timestamp(segment.start_ms),
                ms_to_timestamp(segment.end_ms),
                segment.text.trim()
            );
        }
        None => println!("no segment at {at_ms}ms"),
    }
    Ok(())
}
