use std::sync::Arc;
use std::time::Duration;

use common::hook::HookRegistry;
use common::protection::{
    CheckStateStore, MembershipValidator, ProtectionScheduler, Reconciler, UploadDirEvent,
    UploadRelocator, ValidateValueEvent,
};

use crate::config::AppConfig;
use crate::media::MediaLibrary;
use crate::meta::PostMetaStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub hooks: Arc<HookRegistry>,
    pub media: Arc<MediaLibrary>,
    pub posts: Arc<PostMetaStore>,
    pub reconciler: Arc<Reconciler>,
    pub scheduler: ProtectionScheduler,
}

impl AppState {
    /// Wire the protection core into a fresh state.
    pub fn new(config: AppConfig, check_state: Arc<dyn CheckStateStore>) -> Self {
        let media = Arc::new(MediaLibrary::new());
        let reconciler = Arc::new(Reconciler::from_config(
            &config.site,
            &config.protection,
            check_state,
        ));
        let scheduler = ProtectionScheduler::new(
            reconciler.clone(),
            Duration::from_secs(config.protection.scheduler_interval_secs.max(1)),
        );
        let hooks = register_hooks(&config, &reconciler, media.clone());

        Self {
            config: Arc::new(config),
            hooks: Arc::new(hooks),
            media,
            posts: Arc::new(PostMetaStore::new()),
            reconciler,
            scheduler,
        }
    }
}

/// Register the upload relocator and membership validator for the managed field only.
fn register_hooks(
    config: &AppConfig,
    reconciler: &Reconciler,
    media: Arc<MediaLibrary>,
) -> HookRegistry {
    let field_key = &config.fields.file_field_key;
    let mut hooks = HookRegistry::new();
    hooks.add_hook::<UploadDirEvent, _>(UploadRelocator::new(
        field_key.clone(),
        config.protection.directory_name.clone(),
    ));
    hooks.add_hook::<ValidateValueEvent, _>(MembershipValidator::new(
        field_key.clone(),
        reconciler.directory().clone(),
        media,
    ));
    hooks
}
