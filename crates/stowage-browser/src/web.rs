//! Browser web storage through `web-sys`.

use wasm_bindgen::{JsCast, JsValue};

use crate::host::{HostError, InProcessStore, StorageCall, StorageReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageArea {
    /// `window.localStorage`
    #[default]
    Local,
    /// `window.sessionStorage`
    Session,
}

/// One of the window's storage areas.
///
/// The storage object is looked up on every call instead of being held, which keeps the store
/// `Send + Sync` and lets an access denial surface on the call that hit it.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebStorage {
    area: StorageArea,
}

impl WebStorage {
    pub fn local() -> Self {
        Self { area: StorageArea::Local }
    }

    pub fn session() -> Self {
        Self { area: StorageArea::Session }
    }

    pub fn area(&self) -> StorageArea {
        self.area
    }

    fn open(&self) -> Result<web_sys::Storage, HostError> {
        let window = web_sys::window().ok_or_else(|| HostError::Script("no global `window` exists".to_owned()))?;

        let storage = match self.area {
            StorageArea::Local => window.local_storage(),
            StorageArea::Session => window.session_storage(),
        }
        .map_err(script_error)?;

        storage.ok_or_else(|| HostError::Script("web storage is not available".to_owned()))
    }
}

impl InProcessStore for WebStorage {
    fn invoke(&self, call: StorageCall) -> Result<StorageReply, HostError> {
        let storage = self.open()?;

        let reply = match call {
            StorageCall::Clear => storage.clear().map(|_| StorageReply::Done),
            StorageCall::GetItem { key } => storage.get_item(&key).map(StorageReply::Item),
            StorageCall::SetItem { key, value } => storage.set_item(&key, &value).map(|_| StorageReply::Done),
            StorageCall::RemoveItem { key } => storage.remove_item(&key).map(|_| StorageReply::Done),
            StorageCall::ContainsKey { key } => Ok(StorageReply::Flag(storage.has_own_property(&JsValue::from_str(&key)))),
            StorageCall::Length => storage.length().map(|length| StorageReply::Count(length as usize)),
            StorageCall::Keys => Ok(StorageReply::Keys(
                js_sys::Object::keys(&storage).iter().filter_map(|key| key.as_string()).collect(),
            )),
            StorageCall::Key { index } => match u32::try_from(index) {
                Ok(index) => storage.key(index).map(StorageReply::Item),
                Err(_) => Ok(StorageReply::Item(None)),
            },
        };

        reply.map_err(script_error)
    }
}

fn script_error(value: JsValue) -> HostError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|error| String::from(error.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"));

    HostError::Script(message)
}
