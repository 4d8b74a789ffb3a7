use cuepipe::playlist::{codec, DEFAULT_SAVE_FILE};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    println!("🔍 Playlist Save File Inspector");
    println!("===============================");

    let save_file = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_FILE));

    if !save_file.exists() {
        println!("❌ Save file not found: {}", save_file.display());
        println!("Usage: cargo run --bin inspect_save [save_file]");
        return Ok(());
    }

    println!("📄 Reading: {}", save_file.display());
    let loaded = match codec::load(&save_file) {
        Ok(loaded) => loaded,
        Err(e) if e.is_malformed_document() => {
            println!("❌ Not a usable playlist save file: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let missing = loaded.paths.iter().filter(|p| !p.is_file()).count();
    println!("🎵 Entries: {}", loaded.paths.len());
    println!("▶️  Resumes at: #{}", loaded.resume_index);
    println!("✅ Present: {}", loaded.paths.len() - missing);
    println!("❌ Missing: {}", missing);
    println!();

    let width = loaded.paths.len().to_string().len();
    for (idx, path) in loaded.paths.iter().enumerate() {
        let marker = if idx == loaded.resume_index { '>' } else { ' ' };
        let state = if path.is_file() { "  " } else { "✗ " };
        println!("{}{}{:>width$} : {}", marker, state, idx, path.display(), width = width);
    }

    if loaded.resume_index >= loaded.paths.len() && !loaded.paths.is_empty() {
        println!();
        println!("⚠️  Resume index points past the last entry");
    }

    Ok(())
}
