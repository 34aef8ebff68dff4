//! An asynchronous bridge to a store living on the other side of a channel.
//!
//! This is the shape of hosts that render ahead of the browser: calls are queued as messages
//! and the store answers when the [`BridgeHost`] gets to them, so nothing can be served
//! synchronously.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::host::{AsyncBridge, HostError, InProcessStore, StorageCall, StorageReply};

struct Envelope {
    call: StorageCall,
    reply: oneshot::Sender<Result<StorageReply, HostError>>,
}

/// Client end of the bridge.
#[derive(Clone, Debug)]
pub struct ChannelBridge {
    sender: mpsc::Sender<Envelope>,
}

/// Serving end of the bridge; drive it with [`BridgeHost::run`].
pub struct BridgeHost {
    receiver: mpsc::Receiver<Envelope>,
    store: Arc<dyn InProcessStore>,
}

/// Connects a bridge to `store`, queueing at most `capacity` pending calls.
pub fn channel(store: Arc<dyn InProcessStore>, capacity: usize) -> (ChannelBridge, BridgeHost) {
    let (sender, receiver) = mpsc::channel(capacity);
    (ChannelBridge { sender }, BridgeHost { receiver, store })
}

impl BridgeHost {
    /// Serves calls until every [`ChannelBridge`] clone is dropped.
    pub async fn run(mut self) {
        while let Some(Envelope { call, reply }) = self.receiver.recv().await {
            trace!(%call, "bridge call");
            // the caller may have stopped waiting
            let _ = reply.send(self.store.invoke(call));
        }
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope").field("call", &self.call).finish_non_exhaustive()
    }
}

#[async_trait]
impl AsyncBridge for ChannelBridge {
    async fn invoke(&self, call: StorageCall, cancel: &CancellationToken) -> Result<StorageReply, HostError> {
        let (reply, response) = oneshot::channel();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HostError::Canceled),
            sent = self.sender.send(Envelope { call, reply }) => sent.map_err(|_| HostError::Disconnected)?,
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HostError::Canceled),
            answer = response => answer.map_err(|_| HostError::Disconnected)?,
        }
    }
}
