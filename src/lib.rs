mod auth;
mod error;
mod routes;
mod types;

pub use auth::*;
pub use error::*;
pub use routes::*;
pub use types::*;
