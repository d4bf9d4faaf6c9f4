//! HTTP transport for the Platon payment gateway.
//!
//! Sends requests composed by the [`platon`] crate over `reqwest` and
//! resolves the replies.
//!
//! # Modules
//!
//! - [`client`]: [`PlatonClient`], typed operations and redirect replay
//! - [`constants`]: default timeout, user agent and form content type
//! - [`error`]: [`TransportError`]
//!
//! # Example
//!
//! ```no_run
//! use platon::catalog::Status;
//! use platon::config::Credentials;
//! use platon::request::{PayerIdentity, TransStatusRequest};
//! use platon_http::PlatonClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PlatonClient::try_new(Credentials::from_env()?)?;
//! let request = TransStatusRequest::new("T-1", PayerIdentity::new("a@b.c", "4111111111111111"));
//! let variant = client.trans_status(&request).await?;
//! if variant.status() == Some(Status::Settled) {
//!     println!("settled");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod constants;
pub mod error;

pub use client::{PageResponse, PlatonClient};
pub use error::TransportError;
