//! Error context extension trait
//!
//! Adds `.context()` / `.with_context()` to any result whose error converts
//! into [`IdsnapError`], keeping library code on the domain error type.
//!
//! ```rust
//! use idsnap::domain::Result;
//! use idsnap::domain::context::ResultExt;
//!
//! fn read_rules(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read ignore file {path}"))
//! }
//! ```

use crate::domain::errors::IdsnapError;
use crate::domain::result::Result;
use std::fmt::Display;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Wrap the error with an eagerly built context message
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the error with a context message built only on failure
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<IdsnapError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

/// Prefixes the message while keeping the variant, so exit-code mapping
/// and rejection checks still see the original category.
fn wrap(err: IdsnapError, context: impl Display) -> IdsnapError {
    match err {
        IdsnapError::Configuration(m) => IdsnapError::Configuration(format!("{context}: {m}")),
        IdsnapError::Export(m) => IdsnapError::Export(format!("{context}: {m}")),
        IdsnapError::Validation(m) => IdsnapError::Validation(format!("{context}: {m}")),
        IdsnapError::Serialization(m) => IdsnapError::Serialization(format!("{context}: {m}")),
        IdsnapError::Io(m) => IdsnapError::Io(format!("{context}: {m}")),
        other => IdsnapError::Other(format!("{context}: {other}")),
    }
}
