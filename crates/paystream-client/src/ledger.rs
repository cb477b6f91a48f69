use std::collections::HashMap;
use std::sync::Mutex;

use paystream_core::types::InvocationId;

/// Captured payment proofs, one slot per invocation.
///
/// The transport records into an invocation's slot whenever an outbound
/// response carries a proof header; the relay for that same invocation polls
/// it. Keying by invocation keeps concurrent streams from observing each
/// other's proofs. Entries are evicted when the invocation ends, so the map
/// never outgrows the set of in-flight asks.
#[derive(Debug, Default)]
pub struct ProofLedger {
    inner: Mutex<HashMap<InvocationId, String>>,
}

impl ProofLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a proof for an invocation, overwriting a stale value.
    /// Re-recording the identical proof is a no-op.
    pub fn record(&self, invocation: InvocationId, proof: &str) {
        let mut map = self.lock();
        match map.get(&invocation) {
            Some(current) if current == proof => {}
            _ => {
                map.insert(invocation, proof.to_string());
            }
        }
    }

    /// Latest proof captured for an invocation, if any.
    pub fn get(&self, invocation: InvocationId) -> Option<String> {
        self.lock().get(&invocation).cloned()
    }

    /// Remove and return an invocation's proof. Called when its stream ends.
    pub fn evict(&self, invocation: InvocationId) -> Option<String> {
        self.lock().remove(&invocation)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<InvocationId, String>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself stays usable.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
