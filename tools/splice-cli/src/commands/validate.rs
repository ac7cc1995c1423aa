//! Validate a timeline document.

use std::path::PathBuf;

use splice_model::ProjectDocument;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating document at: {}", path.display());

    let document =
        ProjectDocument::load(&path).map_err(|e| anyhow::anyhow!("Failed to load document: {e}"))?;

    println!("  Version: {}", document.version);
    println!("  Tracks: {}", document.timeline.tracks.len());
    println!("  Clips: {}", document.timeline.clip_count());

    let errors = document.validate();
    if errors.is_empty() {
        println!("\nDocument is valid.");
        Ok(())
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        anyhow::bail!("{} issue(s) found", errors.len())
    }
}
