//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{AlbumBuilder, TestCatalog, NOVA_ID, NOVA_NAME};
//!
//! #[test]
//! fn test_rank_album() {
//!     let catalog = TestCatalog::new();
//!     catalog.add_album(
//!         AlbumBuilder::new("alb-1", "First", "2020-05-01")
//!             .artist(NOVA_ID, NOVA_NAME)
//!             .tracks(10)
//!             .build(),
//!     );
//!     let report = catalog.classify("A", &["alb-1"]);
//!     assert_eq!(report.failures().count(), 0);
//! }
//! ```

#![allow(dead_code)]

mod catalog;
mod constants;
mod fixtures;

pub use catalog::TestCatalog;
pub use constants::*;
pub use fixtures::{AcceptRenames, AlbumBuilder, FakeLibrary, FakePlaylists, RefuseRenames};
