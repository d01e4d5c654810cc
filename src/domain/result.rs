//! Result type alias and lookup outcome for idsnap

use super::errors::IdsnapError;

/// Result type alias for idsnap operations
///
/// # Examples
///
/// ```
/// use idsnap::domain::result::Result;
/// use idsnap::domain::errors::IdsnapError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(IdsnapError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, IdsnapError>;

/// Outcome of a lookup that may legitimately find nothing
///
/// Lookups return `Result<Lookup<T>>`: `Ok(Found)` and `Ok(NotFound)` are both
/// expected answers, only `Err` is a failure that propagates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The value exists
    Found(T),
    /// Nothing there; the string says what was looked up
    NotFound(String),
}

impl<T> Lookup<T> {
    /// Converts into an `Option`, dropping the not-found description
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound(_) => None,
        }
    }

    /// Whether a value was found
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Maps the found value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound(what) => Lookup::NotFound(what),
        }
    }
}
