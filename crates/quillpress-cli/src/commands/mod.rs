pub mod policy;
pub mod sessions;
