//! External system integrations for idsnap.
//!
//! - [`identity`] - Identity-governance platform (inventory listing, export jobs, rules)
//! - [`vcs`] - Version-control host (blob, tree, commit and ref operations)
//!
//! # Design Pattern
//!
//! Each adapter exposes traits the core depends on plus one HTTP
//! implementation. Core code never sees `reqwest` types, and tests swap in
//! in-memory implementations of the same traits.
//!
//! ```rust,no_run
//! use idsnap::adapters::identity::IdentityClient;
//! use idsnap::adapters::vcs::GitHubClient;
//! use idsnap::config::load_config;
//!
//! # fn example() -> idsnap::domain::Result<()> {
//! let config = load_config("idsnap.toml")?;
//! let identity = IdentityClient::new(config.identity.clone())?;
//! let github = GitHubClient::new(config.publish.clone())?;
//! # Ok(())
//! # }
//! ```

pub mod identity;
pub mod vcs;
