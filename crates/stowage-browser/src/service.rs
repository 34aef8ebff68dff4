use std::sync::Arc;

use serde::{
    de::{DeserializeOwned, IntoDeserializer},
    Serialize,
};
use serde_json::Value;
use stowage_json::JsonSerializer;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{Error, Result},
    events::{ChangedEvent, ChangedListener, ChangingEvent, ChangingListener, ListenerId, Listeners, Verdict},
    provider::StorageProvider,
};

/// Typed storage on top of a raw [`StorageProvider`].
///
/// Values are serialized with `J` on write and deserialized on read. A stored string that is not
/// JSON of the requested type is handed back as-is when the type can be built from a string.
/// Writes raise a cancelable [`ChangingEvent`] before touching storage and a [`ChangedEvent`]
/// after; other operations pass straight through.
#[derive(Debug)]
pub struct LocalStorageService<P, J> {
    provider: P,
    serializer: J,
    changing: Listeners<ChangingListener>,
    changed: Listeners<ChangedListener>,
}

impl<P, J> LocalStorageService<P, J>
where
    P: StorageProvider,
    J: JsonSerializer,
{
    pub fn new(provider: P, serializer: J) -> Self {
        Self { provider, serializer, changing: Listeners::default(), changed: Listeners::default() }
    }

    /// The raw provider, for reading and writing stored strings without serialization or events.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn serializer(&self) -> &J {
        &self.serializer
    }

    /// Registers a listener run before every write. Returning [`Verdict::Cancel`] skips the write.
    pub fn on_changing<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ChangingEvent) -> anyhow::Result<Verdict> + Send + Sync + 'static,
    {
        self.changing.subscribe(Arc::new(listener))
    }

    /// Registers a listener run after every write that happened.
    pub fn on_changed<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ChangedEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.changed.subscribe(Arc::new(listener))
    }

    pub fn off_changing(&self, id: ListenerId) -> bool {
        self.changing.unsubscribe(id)
    }

    pub fn off_changed(&self, id: ListenerId) -> bool {
        self.changed.unsubscribe(id)
    }

    pub fn clear(&self) -> Result<()> {
        Ok(self.provider.clear()?)
    }

    pub async fn clear_async(&self, cancel: &CancellationToken) -> Result<()> {
        Ok(self.provider.clear_async(cancel).await?)
    }

    /// Reads `key` as a `T`. Missing and blank values read as `None`.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = self.provider.get_item(key)?;
        self.decode(raw)
    }

    pub async fn get_item_async<T: DeserializeOwned>(&self, key: &str, cancel: &CancellationToken) -> Result<Option<T>> {
        let raw = self.provider.get_item_async(key, cancel).await?;
        self.decode(raw)
    }

    /// Raises [`ChangingEvent`], then serializes and writes unless a listener canceled, then raises
    /// [`ChangedEvent`]. A canceled write returns `Ok` without serializing `value`.
    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        check_key(key)?;
        let old_value = self.decode(self.provider.get_item(key)?)?;

        let Some(changed) = self.raise_changing(key, old_value, value)? else {
            return Ok(());
        };

        let text = self.serializer.serialize(value)?;
        self.provider.set_item(key, &text)?;
        self.raise_changed(changed)
    }

    /// Like [`Self::set_item`]. `cancel` reaches the storage calls only; listeners always run to completion.
    pub async fn set_item_async<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_key(key)?;
        let old_value = self.decode(self.provider.get_item_async(key, cancel).await?)?;

        let Some(changed) = self.raise_changing(key, old_value, value)? else {
            return Ok(());
        };

        let text = self.serializer.serialize(value)?;
        self.provider.set_item_async(key, &text, cancel).await?;
        self.raise_changed(changed)
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        Ok(self.provider.remove_item(key)?)
    }

    pub async fn remove_item_async(&self, key: &str, cancel: &CancellationToken) -> Result<()> {
        Ok(self.provider.remove_item_async(key, cancel).await?)
    }

    pub fn remove_items<K: AsRef<str> + Sync>(&self, keys: &[K]) -> Result<()> {
        Ok(self.provider.remove_items(keys)?)
    }

    pub async fn remove_items_async<K: AsRef<str> + Sync>(&self, keys: &[K], cancel: &CancellationToken) -> Result<()> {
        Ok(self.provider.remove_items_async(keys, cancel).await?)
    }

    pub fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.provider.contains_key(key)?)
    }

    pub async fn contains_key_async(&self, key: &str, cancel: &CancellationToken) -> Result<bool> {
        Ok(self.provider.contains_key_async(key, cancel).await?)
    }

    pub fn length(&self) -> Result<usize> {
        Ok(self.provider.length()?)
    }

    pub async fn length_async(&self, cancel: &CancellationToken) -> Result<usize> {
        Ok(self.provider.length_async(cancel).await?)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.provider.keys()?)
    }

    pub async fn keys_async(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        Ok(self.provider.keys_async(cancel).await?)
    }

    pub fn key(&self, index: usize) -> Result<Option<String>> {
        Ok(self.provider.key(index)?)
    }

    pub async fn key_async(&self, index: usize, cancel: &CancellationToken) -> Result<Option<String>> {
        Ok(self.provider.key_async(index, cancel).await?)
    }

    fn decode<T: DeserializeOwned>(&self, raw: Option<String>) -> Result<Option<T>> {
        let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };

        match self.serializer.deserialize(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_format() => {
                debug!(%error, "stored value is not json of the requested type, reading it as a string");
                let passthrough: serde::de::value::StringDeserializer<serde_json::Error> = raw.into_deserializer();
                // keep the parse error: it says more than "expected X, found string"
                T::deserialize(passthrough).map(Some).map_err(|_| Error::Serialization(error))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Dispatches a [`ChangingEvent`], returning the matching [`ChangedEvent`] unless a listener canceled.
    fn raise_changing<T: Serialize + ?Sized>(
        &self,
        key: &str,
        old_value: Option<Value>,
        value: &T,
    ) -> Result<Option<ChangedEvent>> {
        let new_value = self.serializer.to_value(value)?;
        let mut event = ChangingEvent { key: key.to_owned(), old_value, new_value, cancel: false };

        self.changing.dispatch(&mut event).map_err(|source| Error::Listener { key: key.to_owned(), source })?;

        if event.cancel {
            debug!(key, "write canceled by a changing listener");
            return Ok(None);
        }
        Ok(Some(event.into()))
    }

    fn raise_changed(&self, event: ChangedEvent) -> Result<()> {
        self.changed.dispatch(&event).map_err(|source| Error::Listener { key: event.key.clone(), source })
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey);
    }
    Ok(())
}
