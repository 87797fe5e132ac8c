//! Jira worklog adapter over the gouqi SDK.
//!
//! Several Jira instances may be configured; each [`JiraClient`] talks to one.

mod api_types;
mod client;
pub mod types;

pub use client::JiraClient;
