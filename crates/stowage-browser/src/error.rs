use stowage_json::SerializerError;
use thiserror::Error;

use crate::host::{HostError, StorageCall, StorageReply};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Unable to access the browser storage. This is most likely due to the browser settings.")]
    Unavailable(#[source] HostError),
    #[error("synchronous storage calls are not supported by this host")]
    UnsupportedContext,
    #[error("storage call was canceled")]
    Canceled,
    #[error(transparent)]
    Host(HostError),
    #[error("unexpected reply to {call}: {reply:?}")]
    UnexpectedReply { call: String, reply: StorageReply },
}

impl StorageError {
    pub(crate) fn unexpected(call: &StorageCall, reply: StorageReply) -> Self {
        StorageError::UnexpectedReply { call: call.to_string(), reply }
    }
}

impl From<HostError> for StorageError {
    fn from(error: HostError) -> Self {
        match error {
            HostError::Canceled => StorageError::Canceled,
            error if error.is_access_denied() => StorageError::Unavailable(error),
            error => StorageError::Host(error),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to serialize stored value")]
    Serialization(#[from] SerializerError),
    #[error("storage key must not be empty")]
    InvalidKey,
    #[error("listener failed while handling change of {key:?}")]
    Listener {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// Whether the host refused access to storage, e.g. because of the user's privacy settings.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Unavailable(_)))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Canceled))
    }
}

#[cfg(test)]
mod test {
    use super::{Error, StorageError};
    use crate::host::HostError;

    #[test]
    fn when_host_denies_access_then_error_is_unavailable() {
        let error = StorageError::from(HostError::Script("The operation is insecure.".to_owned()));

        assert!(matches!(error, StorageError::Unavailable(_)));
        assert_eq!(
            error.to_string(),
            "Unable to access the browser storage. This is most likely due to the browser settings."
        );
        assert!(Error::from(error).is_storage_unavailable());
    }

    #[test]
    fn when_host_fails_otherwise_then_error_is_passed_through() {
        let error = StorageError::from(HostError::Script("QuotaExceededError: quota exceeded".to_owned()));

        assert_eq!(error, StorageError::Host(HostError::Script("QuotaExceededError: quota exceeded".to_owned())));
        assert_eq!(error.to_string(), "QuotaExceededError: quota exceeded");
        assert!(!Error::from(error).is_storage_unavailable());
    }

    #[test]
    fn when_host_call_is_canceled_then_error_is_canceled() {
        assert!(Error::from(StorageError::from(HostError::Canceled)).is_canceled());
    }
}
