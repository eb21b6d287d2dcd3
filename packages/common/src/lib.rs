pub mod config;
pub mod event;
pub mod fields;
pub mod hook;
pub mod media;
pub mod protection;

pub use config::{FieldConfig, ProtectionConfig, RulePolicy, SiteConfig};
pub use media::{AttachmentId, MediaResolver};
