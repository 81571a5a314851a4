//! OneView API interaction module
//!
//! This module provides the core functionality for talking to a OneView
//! appliance: login sessions, the HTTP client and the combined client used
//! by the resource layer.
//!
//! # Module Structure
//!
//! - [`auth`] - Login sessions and session token caching
//! - [`client`] - Main OneView client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use oneview_index::oneview::auth::Credentials;
//! use oneview_index::oneview::client::OneViewClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let credentials = Credentials::new("administrator", "secret");
//!     let client = OneViewClient::new("https://oneview.example.com", credentials, 300, false)?;
//!     let version = client.get("/rest/version").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
