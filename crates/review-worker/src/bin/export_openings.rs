//! Write the built-in opening table to a bincode file.
//!
//! Usage: export-openings [output_path]
//!
//! The worker loads the file through OPENING_BOOK_PATH.

use review_worker::opening::OpeningBook;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/openings.bin".to_string());

    if let Some(parent) = std::path::Path::new(&output_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let book = OpeningBook::builtin();
    println!("Exporting {} opening positions...", book.len());

    book.save(&output_path)?;

    let size = std::fs::metadata(&output_path)?.len();
    println!(
        "Exported to {} ({:.1} KB)",
        output_path,
        size as f64 / 1024.0
    );

    // Verify by reading back
    let loaded = OpeningBook::load(&output_path)?;
    println!("Verified: {} positions loaded back", loaded.len());

    Ok(())
}
