pub mod grade;
pub mod init;
pub mod stats;
pub mod submit;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

/// Print to stdout, or write to `output` when given.
pub(crate) fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}
