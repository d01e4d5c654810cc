//! Version-control host integration
//!
//! - [`traits`] - [`VcsHost`] seam used by the batch publisher
//! - [`models`] - GitHub git-data wire bodies
//! - [`github`] - [`GitHubClient`] implementation

pub mod github;
pub mod models;
pub mod traits;

pub use github::GitHubClient;
pub use traits::{TreeEntry, VcsHost};
