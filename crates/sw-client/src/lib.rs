//! Typed access to the SIP Wrapper REST backend.

pub mod client;
pub mod error;
pub mod types;

pub use client::{CrudKind, LoginOutcome, WrapperClient};
pub use error::ClientError;
