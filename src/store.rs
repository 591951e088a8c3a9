use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::metadata_key::MetadataKey;

/// The metadata keys of one package, by raw name.
///
/// A missing key is simply absent: lookups return `None`, never a default.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    keys: BTreeMap<String, MetadataKey>,
}

impl MetadataStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. A store holds at most one key per raw name.
    pub fn insert(&mut self, key: MetadataKey) -> Result<()> {
        if self.keys.contains_key(key.raw_name()) {
            return Err(Error::DuplicateKey(key.raw_name().to_string()));
        }
        self.keys.insert(key.raw_name().to_string(), key);
        Ok(())
    }

    /// Look up a key by raw name.
    pub fn find_metadata(&self, raw_name: &str) -> Option<&MetadataKey> {
        self.keys.get(raw_name)
    }

    /// Keys in raw-name order.
    pub fn keys(&self) -> impl Iterator<Item = &MetadataKey> {
        self.keys.values()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_key::{MetadataKeyType, MetadataValue};

    fn slot(value: &str) -> MetadataKey {
        MetadataKey::new(
            "SLOT",
            "Slot",
            MetadataKeyType::Normal,
            MetadataValue::String(value.to_string()),
        )
    }

    #[test]
    fn lookup() {
        let mut store = MetadataStore::new();
        assert!(store.is_empty());
        store.insert(slot("0")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_metadata("SLOT").unwrap().as_string().unwrap(), "0");
        assert!(store.find_metadata("slot").is_none());
        assert!(store.find_metadata("CONTENTS").is_none());
    }

    #[test]
    fn duplicates_rejected() {
        let mut store = MetadataStore::new();
        store.insert(slot("0")).unwrap();
        assert_eq!(store.insert(slot("1")), Err(Error::DuplicateKey("SLOT".to_string())));
        assert_eq!(store.find_metadata("SLOT").unwrap().as_string().unwrap(), "0");
    }

    #[test]
    fn keys_in_name_order() {
        let mut store = MetadataStore::new();
        for name in ["SLOT", "EAPI", "DESCRIPTION"] {
            store
                .insert(MetadataKey::new(
                    name,
                    name,
                    MetadataKeyType::Normal,
                    MetadataValue::String(String::new()),
                ))
                .unwrap();
        }
        let names: Vec<&str> = store.keys().map(MetadataKey::raw_name).collect();
        assert_eq!(names, vec!["DESCRIPTION", "EAPI", "SLOT"]);
    }
}
