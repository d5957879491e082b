//! Creation upload orchestration.
//!
//! An `UploadSession` drives one `UploadSpec` through the backend's upload
//! workflow:
//!
//! 1. create the creation (unless the `UploadSpec` names an existing one)
//! 2. request a one-time upload destination
//! 3. fetch the payload when it points at a URL
//! 4. post the payload to storage
//! 5. notify the backend that the transfer settled, whatever the result
//! 6. submit the creation to a gallery when one is named
//!
//! Once a destination has been issued the backend is always told how the
//! transfer ended, including when the user cancels.

pub mod error;
pub mod outcome;
pub mod session;
pub mod spec;

pub use error::*;
pub use outcome::*;
pub use session::*;
pub use spec::*;
