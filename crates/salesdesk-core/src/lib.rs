//! Core library for salesdesk.
//!
//! - [`auth`]: session data and the session stores
//! - [`api`]: HTTP transport, the token-refreshing `AuthenticatedClient`, and
//!   the sales endpoints
//! - [`events`]: login-required / reinitialize notifications
//! - [`models`]: request and response types
//! - [`config`]: persisted and runtime configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod events;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse, AuthenticatedClient, RequestError};
pub use auth::{FileSessionStore, MemorySessionStore, SessionData, SessionStore};
pub use config::{ClientConfig, Config};
pub use events::{ClientEvent, ClientEvents};
