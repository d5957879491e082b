pub mod dispatcher;
pub mod oauth;

pub use dispatcher::*;
pub use oauth::*;
