//! Role to permission set resolution.
//!
//! The policy table is static. Each role tier adds routes and capabilities on
//! top of every tier ranked below it, so resolution walks the tiers up to the
//! requested role and accumulates their grants. The result depends on the
//! role alone: no I/O, no clock, no randomness.
//!
//! # Example
//!
//! ```
//! use quillpress_auth::policy::resolve;
//! use quillpress_auth::types::{Capability, Role};
//!
//! let writer = resolve(Role::Writer);
//! assert!(writer.allows(Capability::CreateContent));
//! assert_eq!(writer.default_route, "/writer");
//! ```

use crate::types::{Capabilities, PermissionSet, Role};

/// Routes any authenticated identity may reach.
pub const BASELINE_ROUTES: &[&str] = &["/", "/dashboard", "/profile", "/settings", "/messages"];

const USER_ROUTES: &[&str] = &["/notifications", "/bookmarks", "/article/:id/comments"];

const WRITER_ROUTES: &[&str] = &["/writer", "/article/new", "/article/edit/:id", "/drafts"];

const ADMIN_ROUTES: &[&str] = &["/admin", "/article/review/:id"];

/// Resolves the permission set for `role`.
#[must_use]
pub fn resolve(role: Role) -> PermissionSet {
    let mut capabilities = Capabilities::default();
    let mut allowed_routes = Vec::new();

    for tier in Role::ALL.into_iter().filter(|tier| *tier <= role) {
        grant_tier(tier, &mut capabilities, &mut allowed_routes);
    }

    PermissionSet {
        capabilities,
        allowed_routes,
        default_route: landing_route(role).to_string(),
    }
}

/// Resolves a raw role claim, falling back to the baseline set when the claim
/// is absent or unrecognized.
#[must_use]
pub fn resolve_claim(claim: Option<&str>) -> PermissionSet {
    resolve(Role::from_claim(claim))
}

/// The minimal permission set granted to any authenticated identity.
#[must_use]
pub fn baseline() -> PermissionSet {
    resolve(Role::Guest)
}

/// The full policy table, one entry per role in rank order.
#[must_use]
pub fn policy_table() -> Vec<(Role, PermissionSet)> {
    Role::ALL.into_iter().map(|role| (role, resolve(role))).collect()
}

fn grant_tier(tier: Role, capabilities: &mut Capabilities, routes: &mut Vec<String>) {
    let tier_routes = match tier {
        Role::Guest => {
            capabilities.send_messages = true;
            BASELINE_ROUTES
        }
        Role::User => {
            capabilities.comment = true;
            capabilities.like = true;
            USER_ROUTES
        }
        Role::Writer => {
            capabilities.create_content = true;
            capabilities.edit_own_content = true;
            capabilities.access_writer_area = true;
            WRITER_ROUTES
        }
        Role::Admin => {
            capabilities.edit_any_content = true;
            capabilities.delete_any_content = true;
            capabilities.review_content = true;
            capabilities.manage_identities = true;
            capabilities.access_admin_area = true;
            ADMIN_ROUTES
        }
    };
    routes.extend(tier_routes.iter().map(|r| (*r).to_string()));
}

fn landing_route(role: Role) -> &'static str {
    match role {
        Role::Guest | Role::User => "/dashboard",
        Role::Writer => "/writer",
        Role::Admin => "/admin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Capability;

    #[test]
    fn test_every_role_extends_baseline() {
        let base = baseline();
        for role in Role::ALL {
            let set = resolve(role);
            assert!(!set.allowed_routes.is_empty());
            assert!(set.is_superset_of(&base), "{role} must extend baseline");
        }
    }

    #[test]
    fn test_baseline_routes() {
        let base = baseline();
        assert_eq!(base.allowed_routes, BASELINE_ROUTES);
        assert_eq!(base.default_route, "/dashboard");
        assert!(base.allows(Capability::SendMessages));
        assert!(!base.allows(Capability::Comment));
    }

    #[test]
    fn test_monotonic_by_rank() {
        let user = resolve(Role::User);
        let writer = resolve(Role::Writer);
        let admin = resolve(Role::Admin);

        assert!(writer.is_superset_of(&user));
        assert!(admin.is_superset_of(&writer));
        assert!(admin.is_superset_of(&user));

        // strict extension
        assert!(!user.is_superset_of(&writer));
        assert!(!writer.is_superset_of(&admin));
        assert!(!baseline().is_superset_of(&user));
    }

    #[test]
    fn test_resolution_is_referentially_stable() {
        for role in Role::ALL {
            assert_eq!(resolve(role), resolve(role));
        }
    }

    #[test]
    fn test_unknown_claim_resolves_to_baseline() {
        assert_eq!(resolve_claim(Some("moderator")), baseline());
        assert_eq!(resolve_claim(None), baseline());
        assert_eq!(resolve_claim(Some("ADMIN")), resolve(Role::Admin));
    }

    #[test]
    fn test_admin_capabilities() {
        let admin = resolve(Role::Admin);
        for capability in Capability::ALL {
            assert!(admin.allows(capability), "admin lacks {capability}");
        }
        assert_eq!(admin.default_route, "/admin");
        assert!(admin.allowed_routes.iter().any(|r| r == "/admin"));
    }

    #[test]
    fn test_only_admin_reaches_admin_area() {
        for role in [Role::Guest, Role::User, Role::Writer] {
            let set = resolve(role);
            assert!(!set.allows(Capability::AccessAdminArea));
            assert!(!set.allowed_routes.iter().any(|r| r.starts_with("/admin")));
        }
    }

    #[test]
    fn test_policy_table_has_no_duplicate_routes() {
        for (role, set) in policy_table() {
            let mut routes = set.allowed_routes.clone();
            routes.sort();
            routes.dedup();
            assert_eq!(routes.len(), set.allowed_routes.len(), "{role}");
        }
    }
}
