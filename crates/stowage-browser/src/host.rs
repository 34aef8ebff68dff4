//! The host side of the storage boundary.
//!
//! Hosts speak a small call protocol ([`StorageCall`] in, [`StorageReply`] out) mirroring the
//! browser `Storage` interface. A host is reachable either in-process, where a call completes
//! before returning, or only through an asynchronous bridge; [`HostRuntime`] names which.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Messages hosts raise when the user or browser policy blocks access to web storage.
const ACCESS_DENIED_MARKERS: &[&str] = &[
    "Failed to read the 'localStorage' property from 'Window'",
    "Failed to read the 'sessionStorage' property from 'Window'",
    "The operation is insecure",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Clear,
    GetItem { key: String },
    SetItem { key: String, value: String },
    RemoveItem { key: String },
    ContainsKey { key: String },
    Length,
    Keys,
    Key { index: usize },
}

impl fmt::Display for StorageCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageCall::Clear => write!(f, "storage.clear()"),
            StorageCall::GetItem { key } => write!(f, "storage.getItem({key:?})"),
            StorageCall::SetItem { key, .. } => write!(f, "storage.setItem({key:?}, ..)"),
            StorageCall::RemoveItem { key } => write!(f, "storage.removeItem({key:?})"),
            StorageCall::ContainsKey { key } => write!(f, "storage.hasOwnProperty({key:?})"),
            StorageCall::Length => write!(f, "storage.length"),
            StorageCall::Keys => write!(f, "Object.keys(storage)"),
            StorageCall::Key { index } => write!(f, "storage.key({index})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageReply {
    Done,
    Item(Option<String>),
    Flag(bool),
    Count(usize),
    Keys(Vec<String>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// An exception raised by the host's script engine.
    #[error("{0}")]
    Script(String),
    #[error("host bridge is disconnected")]
    Disconnected,
    #[error("host call was canceled")]
    Canceled,
}

impl HostError {
    /// Whether the host refused access to the storage object itself.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, HostError::Script(message) if ACCESS_DENIED_MARKERS.iter().any(|marker| message.contains(marker)))
    }
}

/// A host store that serves calls synchronously.
#[cfg_attr(test, automock)]
pub trait InProcessStore: Send + Sync {
    fn invoke(&self, call: StorageCall) -> Result<StorageReply, HostError>;
}

/// A host store reachable only through an asynchronous bridge.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AsyncBridge: Send + Sync {
    async fn invoke(&self, call: StorageCall, cancel: &CancellationToken) -> Result<StorageReply, HostError>;
}

#[derive(Clone)]
pub enum HostRuntime {
    /// Serves both synchronous and asynchronous operations.
    InProcess(Arc<dyn InProcessStore>),
    /// Serves asynchronous operations only.
    AsyncOnly(Arc<dyn AsyncBridge>),
}

impl HostRuntime {
    pub fn in_process<S: InProcessStore + 'static>(store: S) -> Self {
        HostRuntime::InProcess(Arc::new(store))
    }

    pub fn async_only<B: AsyncBridge + 'static>(bridge: B) -> Self {
        HostRuntime::AsyncOnly(Arc::new(bridge))
    }

    pub fn supports_sync(&self) -> bool {
        matches!(self, HostRuntime::InProcess(_))
    }
}

impl fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostRuntime::InProcess(_) => f.write_str("HostRuntime::InProcess"),
            HostRuntime::AsyncOnly(_) => f.write_str("HostRuntime::AsyncOnly"),
        }
    }
}
