use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{
    error::StorageError,
    host::{HostError, HostRuntime, StorageCall, StorageReply},
};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Raw string access to the host's key-value storage.
///
/// Every operation has a synchronous form and an `_async` form taking a cancellation token; both
/// have the same semantics. Synchronous forms fail with [`StorageError::UnsupportedContext`] on
/// hosts that can only be reached asynchronously.
#[trait_variant::make(StorageProvider: Send)]
pub trait LocalStorageProvider {
    fn clear(&self) -> Result<()>;
    async fn clear_async(&self, cancel: &CancellationToken) -> Result<()>;

    fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn get_item_async(&self, key: &str, cancel: &CancellationToken) -> Result<Option<String>>;

    /// Overwrites any existing value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn set_item_async(&self, key: &str, value: &str, cancel: &CancellationToken) -> Result<()>;

    /// Removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> Result<()>;
    async fn remove_item_async(&self, key: &str, cancel: &CancellationToken) -> Result<()>;

    /// Removes `keys` in order, stopping at the first failure. Keys before it stay removed.
    fn remove_items<K: AsRef<str> + Sync>(&self, keys: &[K]) -> Result<()>;
    async fn remove_items_async<K: AsRef<str> + Sync>(&self, keys: &[K], cancel: &CancellationToken) -> Result<()>;

    fn contains_key(&self, key: &str) -> Result<bool>;
    async fn contains_key_async(&self, key: &str, cancel: &CancellationToken) -> Result<bool>;

    fn length(&self) -> Result<usize>;
    async fn length_async(&self, cancel: &CancellationToken) -> Result<usize>;

    fn keys(&self) -> Result<Vec<String>>;
    async fn keys_async(&self, cancel: &CancellationToken) -> Result<Vec<String>>;

    /// The key at `index`, or `None` when out of range.
    fn key(&self, index: usize) -> Result<Option<String>>;
    async fn key_async(&self, index: usize, cancel: &CancellationToken) -> Result<Option<String>>;
}

type Extract<R> = fn(StorageReply) -> std::result::Result<R, StorageReply>;

#[derive(Debug, Clone)]
pub struct BrowserStorageProvider {
    runtime: HostRuntime,
}

impl BrowserStorageProvider {
    pub fn new(runtime: HostRuntime) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &HostRuntime {
        &self.runtime
    }

    fn exchange<R>(&self, call: StorageCall, extract: Extract<R>) -> Result<R> {
        let HostRuntime::InProcess(store) = &self.runtime else {
            return Err(StorageError::UnsupportedContext);
        };

        trace!(%call, "storage call");
        let reply = store.invoke(call.clone()).map_err(translate)?;
        extract(reply).map_err(|reply| StorageError::unexpected(&call, reply))
    }

    async fn exchange_async<R>(&self, call: StorageCall, extract: Extract<R>, cancel: &CancellationToken) -> Result<R> {
        if cancel.is_cancelled() {
            debug!(%call, "storage call canceled before dispatch");
            return Err(StorageError::Canceled);
        }

        trace!(%call, "storage call");
        let reply = match &self.runtime {
            HostRuntime::InProcess(store) => store.invoke(call.clone()),
            HostRuntime::AsyncOnly(bridge) => bridge.invoke(call.clone(), cancel).await,
        }
        .map_err(translate)?;

        extract(reply).map_err(|reply| StorageError::unexpected(&call, reply))
    }
}

impl StorageProvider for BrowserStorageProvider {
    fn clear(&self) -> Result<()> {
        self.exchange(StorageCall::Clear, done)
    }

    async fn clear_async(&self, cancel: &CancellationToken) -> Result<()> {
        self.exchange_async(StorageCall::Clear, done, cancel).await
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.exchange(StorageCall::GetItem { key: key.to_owned() }, item)
    }

    async fn get_item_async(&self, key: &str, cancel: &CancellationToken) -> Result<Option<String>> {
        self.exchange_async(StorageCall::GetItem { key: key.to_owned() }, item, cancel).await
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.exchange(StorageCall::SetItem { key: key.to_owned(), value: value.to_owned() }, done)
    }

    async fn set_item_async(&self, key: &str, value: &str, cancel: &CancellationToken) -> Result<()> {
        self.exchange_async(StorageCall::SetItem { key: key.to_owned(), value: value.to_owned() }, done, cancel).await
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.exchange(StorageCall::RemoveItem { key: key.to_owned() }, done)
    }

    async fn remove_item_async(&self, key: &str, cancel: &CancellationToken) -> Result<()> {
        self.exchange_async(StorageCall::RemoveItem { key: key.to_owned() }, done, cancel).await
    }

    fn remove_items<K: AsRef<str> + Sync>(&self, keys: &[K]) -> Result<()> {
        keys.iter().try_for_each(|key| self.exchange(StorageCall::RemoveItem { key: key.as_ref().to_owned() }, done))
    }

    async fn remove_items_async<K: AsRef<str> + Sync>(&self, keys: &[K], cancel: &CancellationToken) -> Result<()> {
        // the token is checked before every key
        for key in keys {
            self.exchange_async(StorageCall::RemoveItem { key: key.as_ref().to_owned() }, done, cancel).await?;
        }

        Ok(())
    }

    fn contains_key(&self, key: &str) -> Result<bool> {
        self.exchange(StorageCall::ContainsKey { key: key.to_owned() }, flag)
    }

    async fn contains_key_async(&self, key: &str, cancel: &CancellationToken) -> Result<bool> {
        self.exchange_async(StorageCall::ContainsKey { key: key.to_owned() }, flag, cancel).await
    }

    fn length(&self) -> Result<usize> {
        self.exchange(StorageCall::Length, count)
    }

    async fn length_async(&self, cancel: &CancellationToken) -> Result<usize> {
        self.exchange_async(StorageCall::Length, count, cancel).await
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.exchange(StorageCall::Keys, keys)
    }

    async fn keys_async(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        self.exchange_async(StorageCall::Keys, keys, cancel).await
    }

    fn key(&self, index: usize) -> Result<Option<String>> {
        self.exchange(StorageCall::Key { index }, item)
    }

    async fn key_async(&self, index: usize, cancel: &CancellationToken) -> Result<Option<String>> {
        self.exchange_async(StorageCall::Key { index }, item, cancel).await
    }
}

fn translate(error: HostError) -> StorageError {
    let error = StorageError::from(error);
    if let StorageError::Unavailable(source) = &error {
        debug!(%source, "browser storage access denied");
    }
    error
}

fn done(reply: StorageReply) -> std::result::Result<(), StorageReply> {
    match reply {
        StorageReply::Done => Ok(()),
        other => Err(other),
    }
}

fn item(reply: StorageReply) -> std::result::Result<Option<String>, StorageReply> {
    match reply {
        StorageReply::Item(item) => Ok(item),
        other => Err(other),
    }
}

fn flag(reply: StorageReply) -> std::result::Result<bool, StorageReply> {
    match reply {
        StorageReply::Flag(flag) => Ok(flag),
        other => Err(other),
    }
}

fn count(reply: StorageReply) -> std::result::Result<usize, StorageReply> {
    match reply {
        StorageReply::Count(count) => Ok(count),
        other => Err(other),
    }
}

fn keys(reply: StorageReply) -> std::result::Result<Vec<String>, StorageReply> {
    match reply {
        StorageReply::Keys(keys) => Ok(keys),
        other => Err(other),
    }
}
