// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - required for every catalog management endpoint
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// CATEGORY CONSTANTS
// =============================================================================

/// Upper bound on ancestor hops walked when checking for parent cycles
pub const MAX_CATEGORY_DEPTH: usize = 64;
