//! Replay an operation log against a document.

use std::path::{Path, PathBuf};

use anyhow::Context;

use splice_common::config::AppConfig;
use splice_engine::{Editor, Operation, Origin};
use splice_model::{ProjectDocument, TimelineDocument};

/// Parse a JSONL log. Blank lines and `#` comments are skipped.
fn read_ops(path: &Path) -> anyhow::Result<Vec<(usize, Operation)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            let op = serde_json::from_str(line)
                .with_context(|| format!("{}:{number}: invalid operation", path.display()))?;
            Ok((number, op))
        })
        .collect()
}

pub fn run(
    path: PathBuf,
    ops_path: PathBuf,
    output: Option<PathBuf>,
    undo: usize,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let document =
        ProjectDocument::load(&path).map_err(|e| anyhow::anyhow!("Failed to load document: {e}"))?;
    let ops = read_ops(&ops_path)?;

    let mut editor = Editor::with_defaults(
        TimelineDocument::from_timeline(document.timeline),
        &config.editor,
    );

    println!("Replaying {} operation(s) from {}", ops.len(), ops_path.display());
    let mut rejected = 0;
    for (line, op) in ops {
        let op_type = op.op_type();
        let outcome = editor.execute(op.into(), Origin::Local);
        if !outcome.applied {
            rejected += 1;
        }
        println!(
            "  line {line:>3}  {op_type:<18} {}",
            if outcome.applied { "applied" } else { "rejected" }
        );
    }

    let mut undone = 0;
    while undone < undo && editor.undo() {
        undone += 1;
    }
    if undo > 0 {
        println!("Undid {undone} step(s)");
    }

    let result = editor.to_project();
    tracing::info!(
        rejected,
        tracks = result.timeline.tracks.len(),
        clips = result.timeline.clip_count(),
        "Replay finished"
    );
    println!(
        "\nResult: {} track(s), {} clip(s), {:.2}s",
        result.timeline.tracks.len(),
        result.timeline.clip_count(),
        result.timeline.duration() / 1000.0
    );

    let issues = result.validate();
    for issue in &issues {
        println!("  - {issue}");
    }

    if let Some(output) = output {
        result
            .save(&output)
            .map_err(|e| anyhow::anyhow!("Failed to save document: {e}"))?;
        println!("Wrote {}", output.display());
    }

    if !issues.is_empty() {
        anyhow::bail!("result has {} validation issue(s)", issues.len());
    }
    Ok(())
}
