//! One outbound HTTP call at a time, classified and cancellable.
//!
//! - `Request` describes a call the way the API layer thinks about it:
//!   a path or absolute URL plus an authorization requirement.
//! - `HttpRequest` is the fully resolved call handed to an `HttpTransport`.
//! - `TransportUnit` performs one `HttpRequest` exactly once, racing it
//!   against a cancellation token, and reports a `UnitOutcome`.

pub mod progress;
pub mod request;
pub mod transport;
pub mod unit;

pub mod reqwest_transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use progress::*;
pub use request::*;
pub use reqwest_transport::*;
pub use transport::*;
pub use unit::*;

pub use tokio_util::sync::CancellationToken;
