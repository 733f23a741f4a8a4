//! HTTP layer for bookmirror: session bootstrap and the content API client.
//!
//! This crate provides:
//! - [`session`] — exchanges the long-lived session token for a jwt and
//!   builds the shared authenticated `reqwest::Client`
//! - [`api`] — typed calls against the content API (book edition, exercise)

pub mod api;
pub mod session;

pub use api::ApiClient;
pub use session::{Session, SessionOptions};
