//! Core constants, errors, and the transport trait.
//!
//! This module has no dependency on the codec or the session layer and
//! is safe to use from device-side implementations as well.

pub mod constants;
mod error;
mod traits;

pub use constants::*;
pub use error::LinkError;
pub use traits::Transport;
