//! Data models for the sales API.
//!
//! - `User`, `AuthTokens`: identity and credential pair returned by login
//! - `LoginRequest`/`LoginResponse`, `RefreshRequest`/`RefreshResponse`: token endpoints
//! - `Customer`, `Warehouse`, `Product`: reference data for sale creation
//! - `Page`, `SalesQuery`: paginated list envelope and list filters
//!
//! Sale records and sale creation payloads are kept as opaque JSON; pricing
//! and discount rules belong to the server.

pub mod auth;
pub mod sales;

pub use auth::{AuthTokens, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, User};
pub use sales::{Customer, InventoryItem, Page, Product, SalesQuery, Warehouse};
