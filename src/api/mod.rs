//! # API Module
//!
//! HTTP handlers served by the local loopback listener during authorization.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the OAuth redirect from Spotify's consent page,
//!   captures the authorization code and answers with a page telling the user
//!   to return to the terminal.
//!
//! The listener serves a single request, so there is no health or status
//! endpoint; see [`crate::server::LoopbackAuthServer`] for the lifecycle.
//!
//! ## Privacy
//!
//! Handlers never print request details. The authorization code only travels
//! through the in-memory [`crate::types::AuthSession`].

mod callback;

pub use callback::callback;
