//! # Persistence Gateway
//!
//! Named text blobs in, named text blobs out. The core only knows this
//! trait; the app provides the file-backed implementation.
//!
//! Failures are terminal for the operation: nothing is retried and no
//! partial state is produced, since decoding happens before anything is
//! returned to the caller.

use crate::primitives::{CATEGORIES_FILE, CONFIG_FILE, DATA_FILE};
use crate::{CategoryData, Config, Data, KubelError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Storage for the JSON documents.
pub trait Gateway: Send + Sync {
    /// Read the document `name`.
    fn load(&self, name: &str) -> Result<String, KubelError>;

    /// Replace the document `name`.
    fn save(&self, name: &str, content: &str) -> Result<(), KubelError>;

    /// Whether `name` exists.
    fn exists(&self, name: &str) -> bool {
        self.load(name).is_ok()
    }
}

// =============================================================================
// TYPED HELPERS
// =============================================================================

/// Load and decode a JSON document.
pub fn load_json<T: DeserializeOwned>(gateway: &dyn Gateway, name: &str) -> Result<T, KubelError> {
    let content = gateway.load(name)?;
    serde_json::from_str(&content)
        .map_err(|e| KubelError::DeserializationError(format!("{name}: {e}")))
}

/// Encode (pretty-printed) and store a JSON document.
pub fn save_json<T: Serialize>(
    gateway: &dyn Gateway,
    name: &str,
    value: &T,
) -> Result<(), KubelError> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| KubelError::SerializationError(format!("{name}: {e}")))?;
    gateway.save(name, &content)
}

/// Load `categories.json`, checking that every category carries a `phases` object.
pub fn load_category_data(gateway: &dyn Gateway) -> Result<CategoryData, KubelError> {
    let raw: serde_json::Value = load_json(gateway, CATEGORIES_FILE)?;
    let Some(categories) = raw.as_object() else {
        return Err(KubelError::MalformedSchema(
            "top level must be an object of categories".to_string(),
        ));
    };
    for (id, category) in categories {
        if !category.get("phases").is_some_and(serde_json::Value::is_object) {
            return Err(KubelError::MalformedSchema(format!(
                "category '{id}' has no phases object"
            )));
        }
    }
    serde_json::from_value(raw).map_err(|e| KubelError::MalformedSchema(e.to_string()))
}

pub fn load_data(gateway: &dyn Gateway) -> Result<Data, KubelError> {
    load_json(gateway, DATA_FILE)
}

pub fn save_data(gateway: &dyn Gateway, data: &Data) -> Result<(), KubelError> {
    save_json(gateway, DATA_FILE, data)
}

/// Load `config.json`; a missing file yields the defaults.
pub fn load_config(gateway: &dyn Gateway) -> Result<Config, KubelError> {
    if !gateway.exists(CONFIG_FILE) {
        return Ok(Config::default());
    }
    load_json(gateway, CONFIG_FILE)
}

pub fn save_config(gateway: &dyn Gateway, config: &Config) -> Result<(), KubelError> {
    save_json(gateway, CONFIG_FILE, config)
}

// =============================================================================
// IN-MEMORY GATEWAY
// =============================================================================

/// Gateway keeping documents in memory (tests, embedding).
#[derive(Debug, Default)]
pub struct MemoryGateway {
    documents: Mutex<BTreeMap<String, String>>,
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a gateway with documents.
    #[must_use]
    pub fn with_documents<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            documents: Mutex::new(
                documents
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl Gateway for MemoryGateway {
    fn load(&self, name: &str) -> Result<String, KubelError> {
        let documents = self
            .documents
            .lock()
            .map_err(|_| KubelError::IoError("memory gateway lock poisoned".to_string()))?;
        documents
            .get(name)
            .cloned()
            .ok_or_else(|| KubelError::IoError(format!("{name}: not found")))
    }

    fn save(&self, name: &str, content: &str) -> Result<(), KubelError> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| KubelError::IoError("memory gateway lock poisoned".to_string()))?;
        documents.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.documents
            .lock()
            .map(|documents| documents.contains_key(name))
            .unwrap_or(false)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PersonOrder, Selection};
    use chrono::DateTime;

    const CATEGORIES: &str = r#"{
        "motor": { "name": "Motor", "phases": {
            "1": { "entries": [ { "description": "lifts head" } ] },
            "2": { "name": "Phase 2", "entries": [] }
        } }
    }"#;

    #[test]
    fn loads_category_data_in_file_order() {
        let gateway = MemoryGateway::with_documents([(CATEGORIES_FILE, CATEGORIES)]);
        let schema = load_category_data(&gateway).expect("load");
        assert_eq!(schema["motor"].phase_ids(), vec!["1", "2"]);
    }

    #[test]
    fn rejects_category_without_phases() {
        let gateway =
            MemoryGateway::with_documents([(CATEGORIES_FILE, r#"{ "motor": { "name": "Motor" } }"#)]);
        assert!(matches!(
            load_category_data(&gateway),
            Err(KubelError::MalformedSchema(_))
        ));

        let gateway = MemoryGateway::with_documents([(CATEGORIES_FILE, "[]")]);
        assert!(matches!(
            load_category_data(&gateway),
            Err(KubelError::MalformedSchema(_))
        ));
    }

    #[test]
    fn data_round_trips_through_gateway() {
        let gateway = MemoryGateway::with_documents([(CATEGORIES_FILE, CATEGORIES)]);
        let schema = load_category_data(&gateway).expect("schema");
        let mut data = Data::new();
        let now = DateTime::from_timestamp(0, 0).expect("timestamp");
        let id = data.add_person("Mia", &schema, now).expect("add");
        data.people[&id].categories["motor"].phases["1"].entries[0] = Selection::Do;

        save_data(&gateway, &data).expect("save");
        let raw = gateway.load(DATA_FILE).expect("raw");
        assert!(raw.contains("\"lastChanged\""));

        let loaded = load_data(&gateway).expect("load");
        assert_eq!(loaded, data);
    }

    #[test]
    fn missing_and_broken_documents() {
        let gateway = MemoryGateway::new();
        assert!(matches!(load_data(&gateway), Err(KubelError::IoError(_))));
        assert_eq!(load_config(&gateway).expect("config"), Config::default());

        gateway.save(DATA_FILE, "{ not json").expect("save");
        assert!(matches!(
            load_data(&gateway),
            Err(KubelError::DeserializationError(_))
        ));
    }

    #[test]
    fn config_round_trip() {
        let gateway = MemoryGateway::new();
        let mut config = Config::default();
        config
            .set_person_list_order(Some("birthday"), Some("desc"))
            .expect("order");
        save_config(&gateway, &config).expect("save");
        let loaded = load_config(&gateway).expect("load");
        assert_eq!(loaded.person_order().0, PersonOrder::Birthday);
    }
}
