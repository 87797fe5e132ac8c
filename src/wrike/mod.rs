//! Wrike API v4 adapter (bearer token, memoized reads).

mod api_types;
mod client;
pub mod types;

pub use client::{WrikeClient, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
