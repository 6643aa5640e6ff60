//! # Spotify Integration Module
//!
//! This module is the HTTP layer between podqueue and Spotify's services. It
//! implements the OAuth token endpoint, the interactive browser authorization
//! and the Web API calls needed to maintain a playlist of podcast episodes.
//!
//! ## Architecture
//!
//! ```text
//! Management Layer (TokenManager, PlaylistReconciler)
//!          ↓            (traits: TokenEndpoint, Authorizer, PlaylistApi)
//! Spotify Integration Layer
//!     ├── Authentication (authorization code flow, client secret)
//!     └── Web API client (playlists, playlist items, show episodes)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! The management layer only talks to the traits, so the state machine and
//! the reconciliation algorithm run unchanged against in-memory fakes.
//!
//! ## Authentication Module
//!
//! [`auth`] - Authorization code flow with a loopback redirect:
//! - **Consent URL**: client id, scopes, redirect URI and a random `state`
//! - **Browser Integration**: opens the consent page, falls back to printing the URL
//! - **Token Endpoint**: code exchange and refresh, authenticated with HTTP Basic
//!   built from the client id and secret
//!
//! A non-200 answer of the token endpoint is reported as
//! [`crate::error::AuthError::Rejected`] and never panics; the token manager
//! falls back to the next path of its state machine.
//!
//! ## Web API Module
//!
//! [`client`] - Bearer-authenticated calls:
//!
//! ### User Data
//! - `GET /me` - Current user id, needed to create playlists
//! - `GET /me/playlists` - User's playlists, paginated by 50
//!
//! ### Playlist Operations
//! - `GET /playlists/{id}` - Liveness check for a cached playlist id
//! - `POST /users/{user_id}/playlists` - Create the playlist
//! - `GET /playlists/{id}/tracks` - Current items, paginated by 100
//! - `POST /playlists/{id}/tracks` - Add up to 100 items
//! - `DELETE /playlists/{id}/tracks` - Remove up to 100 items
//! - `PUT /playlists/{id}` - Update the description
//! - `PUT /playlists/{id}/images` - Upload a base64 JPEG cover
//!
//! ### Shows
//! - `GET /shows/{id}/episodes` - Latest episodes with release date and duration
//!
//! ## Error Handling
//!
//! No call is retried. Every failure surfaces as a typed error and the caller
//! decides whether the run continues.

pub mod auth;
pub mod client;
