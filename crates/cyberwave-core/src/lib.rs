#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod connectivity;
pub mod constants;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod identity;

pub use crate::connectivity::*;
pub use crate::constants::*;
pub use crate::credentials::*;
pub use crate::environment::*;
pub use crate::error::*;
pub use crate::identity::*;
