//! Permission resolution and route authorization.
//!
//! - [`resolver`] maps a [`Role`](crate::types::Role) to its
//!   [`PermissionSet`](crate::types::PermissionSet)
//! - [`matcher`] tests candidate paths against the route patterns of a set

pub mod matcher;
pub mod resolver;

pub use matcher::{RouteMatcher, RoutePattern, is_authorized, matches};
pub use resolver::{BASELINE_ROUTES, baseline, policy_table, resolve, resolve_claim};
