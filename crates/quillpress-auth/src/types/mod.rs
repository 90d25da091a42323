//! Core authorization types.

pub mod permission;
pub mod profile;
pub mod role;

pub use permission::{Capabilities, Capability, PermissionSet};
pub use profile::IdentityProfile;
pub use role::Role;
