//! Warden Memory - Agent memory files and the rules for addressing them.
//!
//! An agent's memory is a small tree of text files under a fixed set of
//! writable directories (`knowledge/`, `skills/`). Two pieces live here:
//!
//! - [`PathResolver`]: turns an agent-supplied logical path into a
//!   [`ResolvedPath`], rejecting traversal, foreign namespaces, and names
//!   outside the allowed grammar
//! - [`MemoryStore`]: reads and mutates files, addressed only by
//!   [`ResolvedPath`], in a storage namespace owned by the agent
//!
//! # Example
//!
//! ```
//! use warden_core::AgentId;
//! use warden_memory::PathResolver;
//!
//! let resolver = PathResolver::default();
//! let agent = AgentId::new("agent-1").unwrap();
//!
//! let path = resolver.resolve(&agent, "/agents/agent-1/knowledge/./prefs.md").unwrap();
//! assert_eq!(path.as_str(), "knowledge/prefs.md");
//!
//! assert!(resolver.resolve(&agent, "../../agents/other/knowledge/x.md").is_err());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
pub mod path;
pub mod store;

pub use error::{MemoryError, MemoryResult};
pub use path::{PathPolicy, PathResolver, ResolvedPath};
pub use store::{DEFAULT_MAX_CONTENT_BYTES, MemoryEntry, MemoryStore};
