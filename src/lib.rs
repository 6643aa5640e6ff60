//! Daily Podcast Playlist Library
//!
//! This library keeps a single Spotify playlist filled with the most recent
//! episodes of a fixed set of podcast shows. It authenticates once, caches the
//! credentials, discovers or creates the playlist, optionally clears it, and
//! appends the episodes released inside the configured window.
//!
//! # Modules
//!
//! - `api` - HTTP handler for the local OAuth callback
//! - `cli` - The command-line run and its console output
//! - `config` - Configuration management and environment variables
//! - `error` - Error kinds of every layer
//! - `management` - Credential cache, token lifecycle and playlist reconciliation
//! - `server` - Single-use loopback listener for the OAuth redirect
//! - `spotify` - Spotify accounts service and Web API client
//! - `types` - Data structures and type definitions
//! - `utils` - Date handling and formatting helpers
//!
//! # Example
//!
//! ```
//! use podqueue::{config, cli};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> podqueue::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by glue code that only needs to report an error, not inspect it.
/// The layers below return the typed errors from [`error`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Playlist: {}", name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Episodes added!");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the process with exit code 1 right after printing. Only used
/// for configuration and authorization failures, which end the run before any
/// playlist is touched.
///
/// # Example
///
/// ```
/// error!("Authorization failed: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for failures the run recovers from: a show that could not be fetched,
/// a batch that did not go through, a cache file that could not be written.
///
/// # Example
///
/// ```
/// warning!("Failed to save token to cache: {}", e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
