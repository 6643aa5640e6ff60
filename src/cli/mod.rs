//! # CLI Module
//!
//! The user-facing layer of podqueue. It turns the command-line options into a
//! single update run and reports progress on the console.
//!
//! ## Architecture Design
//!
//! ```text
//! CLI Layer (options, console output, exit codes)
//!     ↓
//! Management Layer (credential cache, token lifecycle, reconciliation)
//!     ↓
//! Spotify Layer (token endpoint, Web API)
//!     ↓
//! Network Layer (HTTP requests, loopback listener)
//! ```
//!
//! ## Error Handling Philosophy
//!
//! - **Fatal**: missing or placeholder credentials and failed authorization
//!   end the run with exit code 1 before the playlist is touched
//! - **Best effort**: an unresolvable playlist, a show that cannot be fetched
//!   or a failing batch is reported as a warning and the run completes
//!
//! ## Usage Patterns
//!
//! ```bash
//! podqueue                          # Refill "Daily Podcasts" with today's episodes
//! podqueue --days 3 --keep-old      # Append the last three days, keep what is there
//! podqueue --playlist "Morning"     # Maintain a differently named playlist
//! ```

mod update;

pub use update::UpdateOptions;
pub use update::update;
