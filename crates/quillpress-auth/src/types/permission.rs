//! Capability flags and permission sets.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Capability
// =============================================================================

/// A single action an identity may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Send and read direct messages.
    SendMessages,
    /// Comment and reply on articles.
    Comment,
    /// Like articles and comments.
    Like,
    /// Create new articles.
    CreateContent,
    /// Edit articles the identity authored.
    EditOwnContent,
    /// Reach the writer area.
    AccessWriterArea,
    /// Edit any article.
    EditAnyContent,
    /// Delete any article or comment.
    DeleteAnyContent,
    /// Approve or reject submitted articles.
    ReviewContent,
    /// Manage other identities and their roles.
    ManageIdentities,
    /// Reach the admin area.
    AccessAdminArea,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 11] = [
        Capability::SendMessages,
        Capability::Comment,
        Capability::Like,
        Capability::CreateContent,
        Capability::EditOwnContent,
        Capability::AccessWriterArea,
        Capability::EditAnyContent,
        Capability::DeleteAnyContent,
        Capability::ReviewContent,
        Capability::ManageIdentities,
        Capability::AccessAdminArea,
    ];

    /// Returns the snake_case name of the capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendMessages => "send_messages",
            Self::Comment => "comment",
            Self::Like => "like",
            Self::CreateContent => "create_content",
            Self::EditOwnContent => "edit_own_content",
            Self::AccessWriterArea => "access_writer_area",
            Self::EditAnyContent => "edit_any_content",
            Self::DeleteAnyContent => "delete_any_content",
            Self::ReviewContent => "review_content",
            Self::ManageIdentities => "manage_identities",
            Self::AccessAdminArea => "access_admin_area",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Fixed set of boolean capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    pub send_messages: bool,
    pub comment: bool,
    pub like: bool,
    pub create_content: bool,
    pub edit_own_content: bool,
    pub access_writer_area: bool,
    pub edit_any_content: bool,
    pub delete_any_content: bool,
    pub review_content: bool,
    pub manage_identities: bool,
    pub access_admin_area: bool,
}

impl Capabilities {
    /// Returns `true` if the flag for `capability` is set.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::SendMessages => self.send_messages,
            Capability::Comment => self.comment,
            Capability::Like => self.like,
            Capability::CreateContent => self.create_content,
            Capability::EditOwnContent => self.edit_own_content,
            Capability::AccessWriterArea => self.access_writer_area,
            Capability::EditAnyContent => self.edit_any_content,
            Capability::DeleteAnyContent => self.delete_any_content,
            Capability::ReviewContent => self.review_content,
            Capability::ManageIdentities => self.manage_identities,
            Capability::AccessAdminArea => self.access_admin_area,
        }
    }

    /// Iterates over the granted capabilities.
    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.allows(*c))
    }

    /// Returns `true` if every capability granted here is also granted by `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Capabilities) -> bool {
        self.granted().all(|c| other.allows(c))
    }
}

// =============================================================================
// Permission Set
// =============================================================================

/// Derived, cacheable bundle of capabilities and route access for a role.
///
/// Produced only by [`resolve`](crate::policy::resolve); never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    /// Capability flags.
    pub capabilities: Capabilities,

    /// Route patterns the identity may reach, in policy order.
    pub allowed_routes: Vec<String>,

    /// Route to land on after sign-in.
    pub default_route: String,
}

impl PermissionSet {
    /// Returns `true` if `capability` is granted.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.allows(capability)
    }

    /// Returns `true` if this set grants everything `other` grants.
    ///
    /// Routes are compared as pattern strings, not by what they match.
    #[must_use]
    pub fn is_superset_of(&self, other: &PermissionSet) -> bool {
        other.capabilities.is_subset_of(&self.capabilities)
            && other
                .allowed_routes
                .iter()
                .all(|route| self.allowed_routes.contains(route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_matches_flags() {
        let caps = Capabilities {
            comment: true,
            access_admin_area: true,
            ..Default::default()
        };
        assert!(caps.allows(Capability::Comment));
        assert!(caps.allows(Capability::AccessAdminArea));
        assert!(!caps.allows(Capability::Like));
        assert_eq!(
            caps.granted().collect::<Vec<_>>(),
            vec![Capability::Comment, Capability::AccessAdminArea]
        );
    }

    #[test]
    fn test_subset() {
        let small = Capabilities {
            send_messages: true,
            ..Default::default()
        };
        let large = Capabilities {
            send_messages: true,
            comment: true,
            ..Default::default()
        };
        assert!(small.is_subset_of(&large));
        assert!(!large.is_subset_of(&small));
        assert!(Capabilities::default().is_subset_of(&small));
    }

    #[test]
    fn test_permission_set_superset_checks_routes() {
        let base = PermissionSet {
            capabilities: Capabilities::default(),
            allowed_routes: vec!["/".into(), "/dashboard".into()],
            default_route: "/dashboard".into(),
        };
        let wider = PermissionSet {
            allowed_routes: vec!["/".into(), "/dashboard".into(), "/admin".into()],
            ..base.clone()
        };
        assert!(wider.is_superset_of(&base));
        assert!(!base.is_superset_of(&wider));
    }

    #[test]
    fn test_capability_names_round_trip_through_serde() {
        for capability in Capability::ALL {
            let json = serde_json::to_string(&capability).unwrap();
            assert_eq!(json, format!("\"{}\"", capability.as_str()));
        }
    }
}
