//! Source acquisition.
//!
//! Archives are downloaded and unpacked, git sources are cloned. Nested and
//! local sources need no acquisition of their own.

pub mod archive;
pub mod git;

pub use archive::ArchiveKind;
