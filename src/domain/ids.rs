//! Domain identifier types with validation
//!
//! Newtype wrappers for identity-platform identifiers plus the closed set of
//! configuration entity kinds that idsnap knows how to export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of configuration object exported from the identity platform
///
/// The serialized form is the platform's own type tag (`ROLE`, `ACCESS_PROFILE`, ...),
/// which is also the directory name artifacts are written under.
///
/// # Examples
///
/// ```
/// use idsnap::domain::EntityKind;
/// use std::str::FromStr;
///
/// let kind = EntityKind::from_str("access-profile").unwrap();
/// assert_eq!(kind, EntityKind::AccessProfile);
/// assert_eq!(kind.as_str(), "ACCESS_PROFILE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Role,
    Source,
    Workflow,
    Transform,
    AccessProfile,
    ServiceDeskIntegration,
    IdentityProfile,
    /// Connector rules; exported by id rather than through an export job
    Rule,
}

impl EntityKind {
    /// Every kind, in enumeration order
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Role,
        EntityKind::Source,
        EntityKind::Workflow,
        EntityKind::Transform,
        EntityKind::AccessProfile,
        EntityKind::ServiceDeskIntegration,
        EntityKind::IdentityProfile,
        EntityKind::Rule,
    ];

    /// Returns the platform type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Role => "ROLE",
            EntityKind::Source => "SOURCE",
            EntityKind::Workflow => "WORKFLOW",
            EntityKind::Transform => "TRANSFORM",
            EntityKind::AccessProfile => "ACCESS_PROFILE",
            EntityKind::ServiceDeskIntegration => "SERVICE_DESK_INTEGRATION",
            EntityKind::IdentityProfile => "IDENTITY_PROFILE",
            EntityKind::Rule => "RULE",
        }
    }

    /// Whether this kind bypasses the submit/poll/fetch export job protocol
    pub fn is_direct_fetch(&self) -> bool {
        matches!(self, EntityKind::Rule)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown entity kind '{s}'. Must be one of: {}",
                    EntityKind::ALL
                        .iter()
                        .map(|k| k.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// Identifier of an exportable item on the identity platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Creates a new ItemId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Item ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the item ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier assigned by the export backend to a submitted export job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Creates a new JobId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ROLE", EntityKind::Role)]
    #[test_case("source", EntityKind::Source)]
    #[test_case("access-profile", EntityKind::AccessProfile)]
    #[test_case(" SERVICE_DESK_INTEGRATION ", EntityKind::ServiceDeskIntegration)]
    #[test_case("identity_profile", EntityKind::IdentityProfile)]
    #[test_case("Rule", EntityKind::Rule)]
    fn test_entity_kind_from_str(input: &str, expected: EntityKind) {
        assert_eq!(EntityKind::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_entity_kind_unknown() {
        let err = EntityKind::from_str("GROUP").unwrap_err();
        assert!(err.contains("Unknown entity kind"));
    }

    #[test]
    fn test_entity_kind_round_trips_through_display() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn test_entity_kind_serde_uses_type_tag() {
        let json = serde_json::to_string(&EntityKind::ServiceDeskIntegration).unwrap();
        assert_eq!(json, "\"SERVICE_DESK_INTEGRATION\"");
        let kind: EntityKind = serde_json::from_str("\"ACCESS_PROFILE\"").unwrap();
        assert_eq!(kind, EntityKind::AccessProfile);
    }

    #[test]
    fn test_only_rule_is_direct_fetch() {
        let direct: Vec<_> = EntityKind::ALL
            .iter()
            .filter(|k| k.is_direct_fetch())
            .collect();
        assert_eq!(direct, vec![&EntityKind::Rule]);
    }

    #[test]
    fn test_item_id_validation() {
        assert!(ItemId::new("2c9180835d2e5168015d32f890ca1581").is_ok());
        assert!(ItemId::new("").is_err());
        assert!(ItemId::new("   ").is_err());
    }

    #[test]
    fn test_job_id_display() {
        let job_id = JobId::new("job-42").unwrap();
        assert_eq!(job_id.to_string(), "job-42");
        assert_eq!(job_id.as_str(), "job-42");
        assert!(JobId::from_str("").is_err());
    }
}
