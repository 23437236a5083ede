//! Runtime assembly and lifecycle.
//!
//! [`RuntimeBuilder`] wires the registry, queue, publisher, sender, and
//! listener into one [`Runtime`]:
//!
//! ```text
//!   Sender ----------------------+
//!                                v
//!   QueueWriter -> queue -> EventListener -> Publisher -> handlers
//!                                ^
//!   Publisher (direct) ----------+
//! ```
//!
//! The runtime starts stopped: [`Runtime::start`] spawns the listener,
//! [`Runtime::shutdown`] cancels it and waits for the in-flight publish to
//! finish. [`Runtime::block_on_signals`] bundles both around an OS signal
//! wait for binaries that have nothing else to do.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::listener::{DeliveryHook, EventListener};
use crate::publisher::Publisher;
use crate::queue::{self, QueueWriter};
use crate::registry::Registry;
use crate::sender::Sender;

/// Step-by-step construction of a [`Runtime`].
pub struct RuntimeBuilder {
    config: Config,
    registry: Registry,
    hook: Option<Arc<dyn DeliveryHook>>,
}

impl RuntimeBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: Registry::new(),
            hook: None,
        }
    }

    /// Registration surface for handlers, subscriptions, and behaviors.
    pub fn registry(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Replaces the whole registry.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Installs a delivery hook on the listener.
    pub fn with_hook(mut self, hook: Arc<dyn DeliveryHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Assembles the runtime. The listener is built but not yet running.
    pub fn build(self) -> Runtime {
        let registry = Arc::new(self.registry);
        let (writer, reader) = queue::event_queue(self.config.queue_capacity());
        let publisher = Publisher::new(Arc::clone(&registry), self.config.strategy);
        let sender = Sender::new(registry);

        let mut listener = EventListener::new(publisher.clone(), reader, writer.clone(), &self.config);
        if let Some(hook) = self.hook {
            listener = listener.with_hook(hook);
        }

        Runtime {
            sender,
            publisher,
            writer,
            token: CancellationToken::new(),
            listener: Some(listener),
            handle: None,
        }
    }
}

/// Assembled dispatch runtime.
///
/// Owns the cancellation token shared by the queue and the listener. Not
/// clonable itself; hand out [`Sender`], [`Publisher`], and [`QueueWriter`]
/// clones instead.
pub struct Runtime {
    sender: Sender,
    publisher: Publisher,
    writer: QueueWriter,
    token: CancellationToken,
    listener: Option<EventListener>,
    handle: Option<JoinHandle<()>>,
}

impl Runtime {
    pub fn builder(config: Config) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    /// Request dispatch facade.
    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// Direct (unqueued) event publishing facade.
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Producer handle for the event queue. Clone freely.
    pub fn queue(&self) -> QueueWriter {
        self.writer.clone()
    }

    /// Token cancelled at shutdown; pass child tokens to long-lived work.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawns the queue listener. Idempotent after the first call.
    ///
    /// Events enqueued before `start` sit in the queue and are delivered
    /// once the listener runs.
    pub fn start(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.handle = Some(listener.spawn(self.token.clone()));
            info!(target: "mediary", "event listener started");
        }
    }

    /// Cancels the token and waits for the listener to stop.
    ///
    /// The publish in flight completes; undelivered queue items are
    /// dropped.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!(target: "mediary", "runtime stopped");
    }

    /// Starts the listener, waits for a termination signal, then shuts
    /// down.
    pub async fn block_on_signals(mut self) -> std::io::Result<()> {
        self.start();
        wait_for_shutdown_signal().await?;
        self.shutdown().await;
        Ok(())
    }
}

/// Completes when the process receives SIGINT, SIGTERM, or SIGQUIT
/// (Ctrl-C only on non-Unix platforms).
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
