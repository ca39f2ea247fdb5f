//! Client core for the Baidu LBS geodata API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). `LbsService` layers an async,
//! one-call-per-endpoint surface on top for Rust hosts that bring a
//! `Transport`.
//!
//! # Design
//! - `LbsClient` is stateless: base URL and token, fixed at construction.
//! - Every endpoint is a `build_*` method; responses are passed through as
//!   `serde_json::Value` except the coordinate transform, which is validated
//!   and narrowed to `(x, y)`.
//! - No retries, caching, pagination or batching.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod transport;
pub mod types;

pub use client::{LbsClient, DEFAULT_BASE_URL};
pub use config::LbsConfig;
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::LbsService;
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{ColumnType, Conversion, ConvSystem, CoordType, NewColumn, NewTable, Page, PoiInput};
