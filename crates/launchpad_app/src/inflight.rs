//! Per-token registry of flows currently running.
//!
//! Each token may have at most one purchase and one decryption in flight.
//! Starting a flow hands out an [`InFlightGuard`]; dropping it frees the slot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::Address;
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Buy,
    Decrypt,
}

impl FlowKind {
    /// Status shown when a second flow of this kind is triggered.
    pub fn busy_message(self, symbol: &str) -> String {
        match self {
            Self::Buy => format!("A purchase is already in progress for {symbol}."),
            Self::Decrypt => format!("A decryption is already in progress for {symbol}."),
        }
    }
}

/// Identifies one run of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(Uuid);

impl RequestToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

type Slots = HashMap<Address, HashMap<FlowKind, RequestToken>>;

#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    slots: Arc<Mutex<Slots>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the `(token, kind)` slot. `None` if it is already taken.
    pub fn try_begin(&self, token: Address, kind: FlowKind) -> Option<InFlightGuard> {
        let mut slots = self.slots.lock();
        let flows = slots.entry(token).or_default();
        if flows.contains_key(&kind) {
            return None;
        }
        let request = RequestToken::new();
        flows.insert(kind, request);
        Some(InFlightGuard {
            slots: Arc::clone(&self.slots),
            token,
            kind,
            request,
        })
    }

    pub fn is_in_flight(&self, token: Address, kind: FlowKind) -> bool {
        self.slots
            .lock()
            .get(&token)
            .is_some_and(|flows| flows.contains_key(&kind))
    }

    /// Tokens with a flow of `kind` running.
    pub fn tokens_in_flight(&self, kind: FlowKind) -> HashSet<Address> {
        self.slots
            .lock()
            .iter()
            .filter(|(_, flows)| flows.contains_key(&kind))
            .map(|(token, _)| *token)
            .collect()
    }
}

/// Holds a slot in the registry until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    slots: Arc<Mutex<Slots>>,
    token: Address,
    kind: FlowKind,
    request: RequestToken,
}

impl InFlightGuard {
    /// Correlates the log lines of one run.
    pub fn request(&self) -> RequestToken {
        self.request
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        if let Some(flows) = slots.get_mut(&self.token) {
            // Only clear the slot this guard claimed.
            if flows.get(&self.kind) == Some(&self.request) {
                flows.remove(&self.kind);
            }
            if flows.is_empty() {
                slots.remove(&self.token);
            }
        }
    }
}
