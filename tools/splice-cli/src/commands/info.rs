//! Show document information.

use std::path::PathBuf;

use splice_model::{Millis, ProjectDocument};

fn secs(ms: Millis) -> f64 {
    ms / 1000.0
}

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let document =
        ProjectDocument::load(&path).map_err(|e| anyhow::anyhow!("Failed to load document: {e}"))?;
    let timeline = &document.timeline;

    println!("Document: {}", path.display());
    println!("  Schema version: {}", document.version);
    println!("  Duration: {:.2}s", secs(timeline.duration()));
    println!(
        "  View: zoom {} / scroll {} / snapping {}",
        timeline.zoom,
        timeline.scroll_x,
        if timeline.snap_enabled { "on" } else { "off" }
    );
    println!();

    println!("Tracks:");
    for track in &timeline.tracks {
        let mut flags = Vec::new();
        if track.muted {
            flags.push("muted");
        }
        if track.locked {
            flags.push("locked");
        }
        if !track.visible {
            flags.push("hidden");
        }
        println!(
            "  {} [{}] {} ({} clips){}",
            track.id,
            track.kind,
            track.name,
            track.clips.len(),
            if flags.is_empty() {
                String::new()
            } else {
                format!(" {}", flags.join(", "))
            }
        );
        for clip in track.clips_by_time() {
            let animated = clip.keyframes.properties().count();
            println!(
                "    {:<16} {:>8.2}s - {:>8.2}s  {:<8} {}{}",
                clip.id,
                secs(clip.start_time),
                secs(clip.end_time),
                clip.kind.as_str(),
                clip.name,
                if animated > 0 {
                    format!("  ({animated} animated)")
                } else {
                    String::new()
                }
            );
        }
    }

    Ok(())
}
