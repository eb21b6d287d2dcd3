use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A payload passed through a hook chain.
pub trait Event: Send + Sync + Sized + Serialize + DeserializeOwned {
    /// Topic hooks subscribe to, e.g. "upload_dir/key=field_protected_file".
    fn topic(&self) -> String;

    fn to_generic_event(&self) -> GenericEvent {
        GenericEvent {
            topic: self.topic(),
            payload: serde_json::to_value(self).unwrap_or_default(),
        }
    }

    fn from_generic_event(e: &GenericEvent) -> Result<Self, anyhow::Error> {
        let payload: Self = serde_json::from_value(e.payload.clone())?;
        Ok(payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl Event for GenericEvent {
    fn topic(&self) -> String {
        self.topic.clone()
    }

    fn from_generic_event(e: &GenericEvent) -> Result<Self, anyhow::Error> {
        Ok(e.clone())
    }
}

/// Builds a topic scoped to a single field, mirroring `name/key=<field_key>`.
pub fn field_topic(name: &str, field_key: &str) -> String {
    format!("{name}/key={field_key}")
}
