//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_runtime::prelude::*;` to import all essential types.

pub use crate::{RuntimeError, RuntimeResult, Warden};

pub use warden_approval::prelude::*;
pub use warden_core::prelude::*;
