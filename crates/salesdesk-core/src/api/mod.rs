//! REST API client module for the sales backend.
//!
//! - `ApiClient`: the transport. Sends one `ApiRequest` and classifies the
//!   response; knows nothing about sessions.
//! - `AuthenticatedClient`: wraps the transport with the session store. It
//!   attaches the bearer token, and on a 401 refreshes the token once and
//!   retries once.
//! - Sales endpoints (`list_sales`, `create_sale`, ...) are methods on
//!   `AuthenticatedClient` so every call goes through the refresh path.

pub mod client;
pub mod error;
pub mod reauth;
pub mod request;
pub mod sales;

pub use client::ApiClient;
pub use error::{ApiError, RequestError};
pub use reauth::AuthenticatedClient;
pub use request::{ApiRequest, ApiResponse};
pub use sales::SaleDetail;
