//! Referrer-gated protection for a single upload subdirectory.
//!
//! The web server enforces the gate through a rewrite rule file placed in the
//! protected directory. This module keeps that file (and a sentinel index file)
//! in sync with the site configuration, steers uploads for the managed field
//! into the directory, and refuses to save file references that live elsewhere.
//!
//! The gate only inspects the `Referer` header, which any client can forge. It
//! keeps casual hotlinking and direct browsing out; it is not authentication.

mod check_state;
mod directory;
mod error;
mod membership;
mod reconciler;
mod relocator;
mod rules;
mod scheduler;

pub use check_state::{
    CheckStateStore, FileCheckStateStore, MemoryCheckStateStore, ProtectionCheckState,
};
pub use directory::{ProtectedDirectory, SentinelFile};
pub use error::ProtectionError;
pub use membership::{MembershipError, MembershipValidator, ValidateValueEvent, Validity};
pub use reconciler::{ProtectionChange, ProtectionFile, ReconcileOutcome, Reconciler, WriteFailure};
pub use relocator::{UploadDirEvent, UploadRelocator, UploadTarget};
pub use rules::generate_rules;
pub use scheduler::ProtectionScheduler;
