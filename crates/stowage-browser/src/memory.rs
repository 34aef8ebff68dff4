use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use crate::host::{HostError, InProcessStore, StorageCall, StorageReply};

/// An in-process store holding items in memory.
///
/// Keys enumerate in lexical order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let items = iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        Self { items: RwLock::new(items) }
    }
}

impl InProcessStore for MemoryStore {
    fn invoke(&self, call: StorageCall) -> Result<StorageReply, HostError> {
        let reply = match call {
            StorageCall::Clear => {
                self.items.write().unwrap_or_else(PoisonError::into_inner).clear();
                StorageReply::Done
            }
            StorageCall::GetItem { key } => {
                StorageReply::Item(self.items.read().unwrap_or_else(PoisonError::into_inner).get(&key).cloned())
            }
            StorageCall::SetItem { key, value } => {
                self.items.write().unwrap_or_else(PoisonError::into_inner).insert(key, value);
                StorageReply::Done
            }
            StorageCall::RemoveItem { key } => {
                self.items.write().unwrap_or_else(PoisonError::into_inner).remove(&key);
                StorageReply::Done
            }
            StorageCall::ContainsKey { key } => {
                StorageReply::Flag(self.items.read().unwrap_or_else(PoisonError::into_inner).contains_key(&key))
            }
            StorageCall::Length => StorageReply::Count(self.items.read().unwrap_or_else(PoisonError::into_inner).len()),
            StorageCall::Keys => {
                StorageReply::Keys(self.items.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect())
            }
            StorageCall::Key { index } => {
                StorageReply::Item(self.items.read().unwrap_or_else(PoisonError::into_inner).keys().nth(index).cloned())
            }
        };

        Ok(reply)
    }
}

#[cfg(test)]
mod test {
    use super::MemoryStore;
    use crate::host::{InProcessStore, StorageCall, StorageReply};

    fn get(store: &MemoryStore, key: &str) -> StorageReply {
        store.invoke(StorageCall::GetItem { key: key.to_owned() }).expect("memory store never fails")
    }

    #[test]
    fn when_item_is_set_twice_then_last_value_wins() {
        let store = MemoryStore::new();

        for value in ["1", "2"] {
            store
                .invoke(StorageCall::SetItem { key: "k".to_owned(), value: value.to_owned() })
                .expect("memory store never fails");
        }

        assert_eq!(get(&store, "k"), StorageReply::Item(Some("2".to_owned())));
    }

    #[test]
    fn when_key_index_is_out_of_range_then_no_key_is_returned() {
        let store = MemoryStore::from_iter([("a", "1"), ("b", "2")]);

        assert_eq!(store.invoke(StorageCall::Key { index: 1 }), Ok(StorageReply::Item(Some("b".to_owned()))));
        assert_eq!(store.invoke(StorageCall::Key { index: 2 }), Ok(StorageReply::Item(None)));
    }

    #[test]
    fn when_cleared_then_store_is_empty() {
        let store = MemoryStore::from_iter([("a", "1")]);

        store.invoke(StorageCall::Clear).expect("memory store never fails");

        assert_eq!(store.invoke(StorageCall::Length), Ok(StorageReply::Count(0)));
        assert_eq!(get(&store, "a"), StorageReply::Item(None));
    }
}
