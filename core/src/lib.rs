//! Async API client core for the FamilyLedger backend.
//!
//! # Overview
//! Turns a typed request intent (an `Endpoint` plus an optional body and
//! query) into a typed result or one classified failure, against a single
//! JSON REST backend that wraps every response in an envelope.
//!
//! # Design
//! - `ApiClient` is constructed explicitly and passed to whoever needs it;
//!   there is no global instance.
//! - Request building and response classification are pure functions over
//!   plain `HttpRequest`/`HttpResponse` values. Only `Transport` does I/O.
//! - The bearer token comes from an injected `CredentialStore`; rejected
//!   sessions are reported to an injected `SessionObserver`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod http;
pub mod multipart;
mod resources;
pub mod response;
pub mod session;
pub mod types;

pub use client::{ApiClient, ClientConfig, NO_BODY};
pub use endpoint::Endpoint;
pub use envelope::{Empty, Envelope, FieldErrors, StringOrInt, StringOrNumber};
pub use error::{ApiError, Error, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use multipart::{FilePart, MultipartForm};
pub use session::{CredentialStore, MemoryCredentials, SessionEvent, SessionObserver};
