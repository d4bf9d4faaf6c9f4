#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the Platon card-payment gateway.
//!
//! This crate composes signed, typed requests for gateway operations and
//! resolves the gateway's JSON responses into a closed set of variants. It
//! performs no I/O: sending bytes is left to a transport such as
//! `platon-http`.
//!
//! # Overview
//!
//! A request model ([`request::SaleRequest`], [`request::CaptureRequest`], ...)
//! is merged with the action and client key into an ordered
//! [`params::ParameterSet`], signed by the [`signature`] engine and handed to
//! the transport as a [`request::GatewayRequest`]. The raw response bytes come
//! back through [`response::resolve`], which dispatches on `result` and
//! returns a [`response::ResponseVariant`].
//!
//! ```
//! use platon::catalog::{Action, Status};
//! use platon::response::{ResponseVariant, resolve};
//!
//! let body = br#"{"action":"SALE","result":"SUCCESS","status":"SETTLED","trans_id":"T1","order_id":"O1"}"#;
//! let variant = resolve(body, Action::Sale).unwrap();
//! assert_eq!(variant.status(), Some(Status::Settled));
//! assert!(matches!(variant, ResponseVariant::SuccessWithStatus(_)));
//! ```
//!
//! # Modules
//!
//! - [`amount`] - Two-decimal money values
//! - [`catalog`] - Closed catalog of wire fields and vocabularies
//! - [`config`] - Merchant credentials
//! - [`describe`] - Human-readable model dumps with masked card data
//! - [`error`] - Error types and machine-checkable kinds
//! - [`params`] - Ordered parameter sets and right-biased merge
//! - [`query`] - Form encoding and decoding
//! - [`request`] - Request models and composition
//! - [`response`] - Response variants and resolution
//! - [`signature`] - Per-operation signature recipes
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod amount;
pub mod catalog;
pub mod config;
pub mod describe;
pub mod error;
pub mod params;
pub mod query;
pub mod request;
pub mod response;
pub mod signature;

pub use error::{Error, ErrorKind};
