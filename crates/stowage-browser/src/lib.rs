//! Typed, observable access to browser key-value storage.
//!
//! [`LocalStorageService`] sits between application values and the raw string storage of the
//! host: it serializes on write, deserializes on read (handing back non-JSON text as a string),
//! and raises a cancelable [`ChangingEvent`] before and a [`ChangedEvent`] after every write it
//! makes. The host is reached through a [`HostRuntime`], which also says whether synchronous
//! calls are possible at all.
//!
//! ```no_run
//! use stowage_browser::{local_storage, HostRuntime, MemoryStore, Verdict};
//!
//! # fn main() -> Result<(), stowage_browser::Error> {
//! let storage = local_storage(HostRuntime::in_process(MemoryStore::new()));
//! storage.on_changing(|event| Ok(if event.key == "locked" { Verdict::Cancel } else { Verdict::Proceed }));
//!
//! storage.set_item("count", &3)?;
//! assert_eq!(storage.get_item::<i32>("count")?, Some(3));
//! # Ok(())
//! # }
//! ```

pub mod bridge;
mod compose;
pub mod error;
pub mod events;
pub mod host;
mod memory;
pub mod provider;
mod service;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use compose::{
    default_serializer, local_storage, local_storage_from_settings, local_storage_with, shared_local_storage,
    BrowserLocalStorage,
};
pub use error::{Error, Result, StorageError};
pub use events::{ChangedEvent, ChangingEvent, ListenerId, Verdict};
pub use host::{AsyncBridge, HostError, HostRuntime, InProcessStore, StorageCall, StorageReply};
pub use memory::MemoryStore;
pub use provider::{BrowserStorageProvider, LocalStorageProvider, StorageProvider};
pub use service::LocalStorageService;
pub use tokio_util::sync::CancellationToken;
