//! Persistence of encoded consent strings.
//!
//! Encoded strings are written to a key-value store under the keys defined by the IAB,
//! where ad SDKs expect to find them. The store is injected into the policy plugins;
//! implementations are responsible for their own synchronization.
use fnv::FnvHashMap;
use parking_lot::RwLock;

pub mod keys {
    pub const TCF_TC_STRING: &str = "IABTCF_TCString";
    pub const TCF_GDPR_APPLIES: &str = "IABTCF_gdprApplies";
    pub const US_PRIVACY_STRING: &str = "IABUSPrivacy_String";
    pub const US_PRIVACY_APPLIED: &str = "IABUSPrivacy_Applied";
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreValue {
    String(String),
    Bool(bool),
}

impl From<String> for StoreValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for StoreValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

pub trait ConsentStore: Send + Sync {
    fn get(&self, key: &str) -> Option<StoreValue>;

    fn set(&self, key: &str, value: StoreValue);
}

/// A [`ConsentStore`] keeping values in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<FnvHashMap<String, StoreValue>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsentStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<StoreValue> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: StoreValue) {
        self.values.write().insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let store = InMemoryStore::new();
        assert_eq!(store.get(keys::TCF_TC_STRING), None);

        store.set(keys::TCF_TC_STRING, "CAAA".to_string().into());
        store.set(keys::TCF_GDPR_APPLIES, true.into());
        assert_eq!(
            store.get(keys::TCF_TC_STRING),
            Some(StoreValue::String("CAAA".to_string()))
        );
        assert_eq!(store.get(keys::TCF_GDPR_APPLIES), Some(StoreValue::Bool(true)));

        store.set(keys::TCF_GDPR_APPLIES, false.into());
        assert_eq!(
            store.get(keys::TCF_GDPR_APPLIES),
            Some(StoreValue::Bool(false))
        );
    }
}
