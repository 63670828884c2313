/// Number of reports revealed per step of the incremental list reveal
pub const REVEAL_PAGE_SIZE: usize = 20;

/// Reveal step for the read-only bank dashboard
pub const BANK_REVEAL_PAGE_SIZE: usize = 24;

/// Upper bound on revealed pages accepted from a client
pub const MAX_REVEAL_PAGES: usize = 500;

/// Photo slots offered per section ("before" / "after") on the report form
pub const MAX_PHOTO_SLOTS: usize = 4;

/// Operations per remote transaction during bulk sync.
/// Kept below the 500-operation ceiling of the legacy document store.
pub const SYNC_BATCH_SIZE: usize = 450;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - manages reports, users and the database connection
pub const ROLE_ADMIN: &str = "admin";

/// Bank role - read-only access to reports and analytics
pub const ROLE_BANK: &str = "bank";
