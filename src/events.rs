//! Lifecycle event bus (spec §4.7).
//!
//! Subscribers register per event kind and are invoked sequentially, in
//! subscription order, awaited to completion before the emitting operation
//! returns. A handler that fails is logged and does not stop the remaining
//! handlers from running — the same per-hook failure isolation used
//! elsewhere in this problem domain, generalized to a plain in-process bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::LifecycleResult;
use crate::state_machine::Layer;

/// A fact the orchestrator publishes after a successful mutation.
#[derive(Debug, Clone)]
pub enum Event {
    AssetCreated { asset_id: String },
    AssetMigrated { asset_id: String, from: Layer, to: Layer, on_chain: Option<OnChainDetails> },
    AssetTransferred { asset_id: String, from: String, to: String, transaction_id: String },
    ResourcePublished { asset_id: String, resource_id: String, domain: String },
    CredentialIssued { asset_id: String, credential_type: String },
}

/// On-chain details attached to a `peer`/`webvh` → `btco` migration event.
#[derive(Debug, Clone)]
pub struct OnChainDetails {
    pub inscription_id: String,
    pub satoshi: Option<u64>,
    pub commit_txid: String,
    pub reveal_txid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AssetCreated,
    AssetMigrated,
    AssetTransferred,
    ResourcePublished,
    CredentialIssued,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::AssetCreated { .. } => EventKind::AssetCreated,
            Event::AssetMigrated { .. } => EventKind::AssetMigrated,
            Event::AssetTransferred { .. } => EventKind::AssetTransferred,
            Event::ResourcePublished { .. } => EventKind::ResourcePublished,
            Event::CredentialIssued { .. } => EventKind::CredentialIssued,
        }
    }
}

/// A subscriber. Failure isolates: the bus logs it and moves on to the next
/// handler rather than aborting emission.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> LifecycleResult<()>;
}

/// Opaque handle returned by [`EventBus::on`]/[`EventBus::once`], usable with
/// [`EventBus::off`].
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionHandle {
    kind: EventKind,
    id: u64,
}

struct Subscription {
    id: u64,
    handler: Arc<dyn EventHandler>,
    once: bool,
}

/// In-process, sequential-per-kind publish/subscribe bus.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<HashMap<EventKind, Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to `kind`, invoked every time such an event is
    /// emitted until unsubscribed.
    pub fn on(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> SubscriptionHandle {
        self.subscribe(kind, handler, false)
    }

    /// Subscribes `handler` to `kind` for exactly one invocation.
    pub fn once(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> SubscriptionHandle {
        self.subscribe(kind, handler, true)
    }

    fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>, once: bool) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().unwrap().entry(kind).or_default().push(Subscription { id, handler, once });
        SubscriptionHandle { kind, id }
    }

    /// Removes a subscription. A no-op if it was already removed (e.g. a
    /// `once` handler that already fired).
    pub fn off(&self, handle: SubscriptionHandle) {
        if let Some(subs) = self.subscribers.lock().unwrap().get_mut(&handle.kind) {
            subs.retain(|s| s.id != handle.id);
        }
    }

    /// Invokes every subscriber of `event.kind()` in subscription order,
    /// sequentially, awaiting each before moving to the next. Returns once
    /// every handler has run.
    pub async fn emit(&self, event: Event) {
        let kind = event.kind();
        let snapshot: Vec<(u64, Arc<dyn EventHandler>, bool)> = {
            let subs = self.subscribers.lock().unwrap();
            subs.get(&kind).map(|v| v.iter().map(|s| (s.id, Arc::clone(&s.handler), s.once)).collect()).unwrap_or_default()
        };

        let mut fired_once: Vec<u64> = Vec::new();
        for (id, handler, once) in snapshot {
            if let Err(e) = handler.handle(&event).await {
                log::error!("event handler {id} for {kind:?} failed: {e}");
            }
            if once {
                fired_once.push(id);
            }
        }

        if !fired_once.is_empty() {
            if let Some(subs) = self.subscribers.lock().unwrap().get_mut(&kind) {
                subs.retain(|s| !fired_once.contains(&s.id));
            }
        }
    }
}
