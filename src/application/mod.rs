// Application layer - the public operations over the repository.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
