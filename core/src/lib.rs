//! Synchronous API client core for the courier delivery service.
//!
//! # Overview
//! `ApiClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). `Session` pairs it
//! with a `Transport` and a `TokenStore` to make authenticated calls, and
//! `DeliveryService` exposes the courier-facing operations on top.
//!
//! # Design
//! - Nothing is global: the base URL, transport, and token store are all
//!   injected, so tests swap in `MockTransport` and `MemoryTokenStore`.
//! - The token is read from the store on every call and passed to the
//!   builder; the client never caches it.
//! - Response bodies are validated on decode. Schema mismatches surface as
//!   `ApiError::DeserializationError`.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.

pub mod client;
pub mod config;
pub mod deliveries;
pub mod error;
pub mod http;
pub mod mock;
pub mod session;
pub mod token;
pub mod types;

pub use client::{endpoints, ApiClient};
pub use config::ClientConfig;
pub use deliveries::{all_delivered, DeliveryService};
pub use error::{ApiError, Operation, SyncError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use mock::MockTransport;
pub use session::Session;
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use types::{
    Business, Customer, Delivery, DeliveryDetails, DeliveryStatus, LatLng, LoginRequest,
    LoginResponse, Marker, Package, PackageStatus, Sender, SenderRef, StatusUpdate,
};
