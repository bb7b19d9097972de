//! Shared constants for integration tests
//!
//! Artist and album ids used by the catalog fixtures. When test data
//! changes, update only this file.

// ============================================================================
// Artists
// ============================================================================

/// Artist ID for "Nova Lines"
pub const NOVA_ID: &str = "ar-nova";

pub const NOVA_NAME: &str = "Nova Lines";

/// Artist ID for "Quiet Harbor"
pub const HARBOR_ID: &str = "ar-harbor";

pub const HARBOR_NAME: &str = "Quiet Harbor";

// ============================================================================
// Tracks
// ============================================================================

/// Four minutes, in milliseconds as the provider reports it.
pub const TRACK_MS: u64 = 240_000;

/// Default ideal autoseason length used by season tests.
pub const IDEAL_LENGTH: usize = 80;
