//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `SessionData`: the credential pair plus the authenticated user
//! - `SessionStore`: the contract the API client reads sessions through,
//!   with in-memory and file-backed implementations
//! - `CredentialStore`: optional OS keychain storage for the login password
//!
//! Invalidating a session publishes `ClientEvent::LoginRequired`.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::CredentialStore;
pub use session::SessionData;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
