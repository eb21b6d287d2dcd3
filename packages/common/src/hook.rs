use anyhow::Result;
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

use crate::event::{Event, GenericEvent};

/// Priority used when a hook does not override [`Hook::priority`].
pub const DEFAULT_PRIORITY: i32 = 10;

/// Errors raised while running a hook chain.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("event rejected by hook {hook}: {reason}")]
    Rejected { hook: String, reason: String },

    #[error("hook {hook} failed: {source}")]
    Failed {
        hook: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("hook not found: {0}")]
    NotFound(String),

    #[error("event payload error: {0}")]
    Payload(#[source] anyhow::Error),
}

/// Typed hook, used for specific event type
#[async_trait]
pub trait Hook<E: Event>: Send + Sync {
    /// Hook identifier
    fn id(&self) -> &str;
    /// Topics this hook is interested in
    fn topics(&self) -> Vec<String>;
    /// Lower runs first. Hooks with equal priority run in registration order.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    async fn on_event(&self, e: &E) -> Result<HookAction<E>>;
}

pub enum HookAction<E: Event> {
    /// Leave the event untouched.
    Pass,
    /// Replace the event seen by later hooks and by the caller.
    Modified(E),
    /// Abort the chain.
    Reject(String),
}

pub type GenericHookAction = HookAction<GenericEvent>;

/// Generic hook trait object for dynamic dispatch
#[async_trait]
trait GenericHook: Send + Sync {
    fn id(&self) -> &str;
    fn topics(&self) -> Vec<String>;
    fn priority(&self) -> i32;
    async fn on_event(&self, e: &GenericEvent) -> Result<GenericHookAction>;
}

/// Adapter to convert typed Hook<E> into GenericHook
struct HookAdapter<E: Event, H: Hook<E>> {
    hook: H,
    _phantom: std::marker::PhantomData<fn(E)>,
}

#[async_trait]
impl<E: Event + 'static, H: Hook<E>> GenericHook for HookAdapter<E, H> {
    fn id(&self) -> &str {
        self.hook.id()
    }
    fn topics(&self) -> Vec<String> {
        self.hook.topics()
    }
    fn priority(&self) -> i32 {
        self.hook.priority()
    }
    async fn on_event(&self, generic_event: &GenericEvent) -> Result<GenericHookAction> {
        let typed_event: E = E::from_generic_event(generic_event)?;
        let action = self.hook.on_event(&typed_event).await?;
        Ok(match action {
            HookAction::Pass => GenericHookAction::Pass,
            HookAction::Modified(modified) => {
                GenericHookAction::Modified(modified.to_generic_event())
            }
            HookAction::Reject(reason) => GenericHookAction::Reject(reason),
        })
    }
}

/// Hooks keyed by topic.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Vec<Arc<dyn GenericHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed hook to the registry
    pub fn add_hook<E: Event + 'static, H: Hook<E> + 'static>(&mut self, hook: H) {
        let adapter: Arc<dyn GenericHook> = Arc::new(HookAdapter::<E, H> {
            hook,
            _phantom: std::marker::PhantomData,
        });

        for topic in adapter.topics() {
            let chain = self.hooks.entry(topic).or_default();
            // Stable: equal priorities keep registration order.
            let pos = chain.partition_point(|h| h.priority() <= adapter.priority());
            chain.insert(pos, adapter.clone());
        }
    }

    /// Remove a hook by its ID from every topic it was registered for.
    pub fn remove_hook(&mut self, hook_id: &str) -> Result<(), HookError> {
        let mut removed = false;
        for chain in self.hooks.values_mut() {
            let before = chain.len();
            chain.retain(|h| h.id() != hook_id);
            removed |= chain.len() != before;
        }
        self.hooks.retain(|_, chain| !chain.is_empty());

        if removed {
            Ok(())
        } else {
            Err(HookError::NotFound(hook_id.to_string()))
        }
    }

    /// Number of hooks subscribed to `topic`.
    pub fn hook_count(&self, topic: &str) -> usize {
        self.hooks.get(topic).map_or(0, Vec::len)
    }

    /// Run every hook subscribed to the event's topic and return the final event.
    pub async fn trigger<E: Event>(&self, event: E) -> Result<E, HookError> {
        let topic = event.topic();
        let hooks = match self.hooks.get(&topic) {
            Some(h) if !h.is_empty() => h,
            _ => return Ok(event),
        };

        let mut generic_event = event.to_generic_event();
        for hook in hooks {
            let action = hook
                .on_event(&generic_event)
                .await
                .map_err(|source| HookError::Failed {
                    hook: hook.id().to_string(),
                    source,
                })?;

            match action {
                HookAction::Pass => {}
                HookAction::Modified(new_event) => {
                    generic_event = new_event;
                }
                HookAction::Reject(reason) => {
                    return Err(HookError::Rejected {
                        hook: hook.id().to_string(),
                        reason,
                    });
                }
            }
        }

        E::from_generic_event(&generic_event).map_err(HookError::Payload)
    }
}
