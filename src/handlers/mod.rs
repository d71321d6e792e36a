//! HTTP request handlers.

mod health;
pub mod v1;
mod webhook;

pub use health::{health, livez, readyz};
pub use webhook::{receive, test_event, test_verify};
