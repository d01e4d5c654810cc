//! Publishing the export root to the version-control host
//!
//! - [`ignore`] - Gitignore-style exclusion rules
//! - [`publisher`] - Blob, tree, commit and non-forcing ref update

pub mod ignore;
pub mod publisher;

pub use self::ignore::IgnoreFilter;
pub use publisher::{collect, BatchPublisher, PublishError, PublishFile, PublishOutcome, PublishState};
