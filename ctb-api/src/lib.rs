//! Creatubbles endpoints.
//!
//! `requests` builds the transport-level `Request` for each endpoint,
//! `parsers` decodes the JSON:API responses into the DTOs in `dto`, and
//! `CtbClient` ties them to an `AuthenticatedDispatcher` for the simple
//! request/response calls. Uploads are orchestrated by `ctb-upload`.

pub mod client;
pub mod dto;
pub mod extension;
pub mod parsers;
pub mod requests;

pub use client::*;
pub use dto::*;
pub use extension::*;
pub use parsers::*;
