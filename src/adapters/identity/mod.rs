//! Identity-governance platform integration
//!
//! - [`traits`] - [`InventorySource`] and [`ExportBackend`] seams
//! - [`models`] - Wire bodies for listing and export jobs
//! - [`client`] - REST implementation of both traits

pub mod client;
pub mod models;
pub mod traits;

pub use client::IdentityClient;
pub use traits::{BackendJobStatus, ExportBackend, InventorySource};
