//! Well-known role name constants.
//!
//! These must match the values stored in `users.role`.

pub const ROLE_FOREMAN: &str = "Foreman";
pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_SUPER_ADMIN: &str = "Super-Admin";

/// Roles that receive administrative digests and certificate escalations.
pub const ADMIN_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_SUPER_ADMIN];
