//! Build script for podqueue.
//!
//! Copies the `.env.example` configuration template into the user's local data
//! directory, next to where the application looks for its `.env` file.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` from the crate root to the local data directory:
/// - Linux: `~/.local/share/podqueue/.env.example`
/// - macOS: `~/Library/Application Support/podqueue/.env.example`
/// - Windows: `%LOCALAPPDATA%/podqueue/.env.example`
///
/// A missing template only produces a cargo warning. Directory or write
/// failures fail the build.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("podqueue");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        let contents = fs::read_to_string(&env_example_path)?;
        fs::write(out_dir.join(".env.example"), contents)?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
