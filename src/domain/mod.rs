//! Domain models and types for idsnap.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ItemId`], [`JobId`]) and the [`EntityKind`] set
//! - **Inventory items** ([`InventoryItem`])
//! - **Error types** ([`IdsnapError`], [`IdentityError`], [`VcsError`])
//! - **Result type alias** ([`Result`]) and the [`Lookup`] outcome
//!
//! # Lookups
//!
//! Lookups that may legitimately miss return `Result<Lookup<T>>`, so an absent
//! rule or branch is an answer rather than an error:
//!
//! ```rust
//! use idsnap::domain::{Lookup, Result};
//!
//! fn find(id: &str) -> Result<Lookup<String>> {
//!     if id == "r1" {
//!         Ok(Lookup::Found("rule body".to_string()))
//!     } else {
//!         Ok(Lookup::NotFound(format!("rule {id}")))
//!     }
//! }
//!
//! assert!(find("r1").unwrap().is_found());
//! assert!(!find("r2").unwrap().is_found());
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod item;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{IdentityError, IdsnapError, VcsError};
pub use ids::{EntityKind, ItemId, JobId};
pub use item::InventoryItem;
pub use result::{Lookup, Result};
