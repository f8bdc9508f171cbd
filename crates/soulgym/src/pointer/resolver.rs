use std::sync::Arc;

use tracing::{trace, warn};

use crate::memory::{ReadMemory, Value, ValueType};
use crate::pointer::PointerChain;
use crate::retry::{RetryPolicy, SharedSleeper, ThreadSleeper};

/// Walks pointer chains with bounded retry
///
/// A null or all-ones intermediate pointer, or any failed read, marks the
/// whole attempt invalid; the walk restarts from the base after the policy
/// delay. Exhaustion degrades to `None`.
#[derive(Clone)]
pub struct PointerResolver {
    policy: RetryPolicy,
    sleeper: SharedSleeper,
}

impl PointerResolver {
    pub fn new(policy: RetryPolicy, sleeper: SharedSleeper) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn sleeper(&self) -> &SharedSleeper {
        &self.sleeper
    }

    /// Resolve `chain` and read its typed value
    pub fn resolve<M: ReadMemory + ?Sized>(
        &self,
        memory: &M,
        chain: &PointerChain,
        name: &str,
    ) -> Option<Value> {
        let base = chain.base.unwrap_or_else(|| memory.base_address());
        self.resolve_from(memory, base, &chain.offsets, chain.value_type, name)
    }

    /// Resolve `offsets` from an explicit base and read a `value_type`
    pub fn resolve_from<M: ReadMemory + ?Sized>(
        &self,
        memory: &M,
        base: u64,
        offsets: &[i64],
        value_type: ValueType,
        name: &str,
    ) -> Option<Value> {
        let result = self.policy.run(self.sleeper.as_ref(), |attempt| {
            let address = walk(memory, base, offsets)?;
            match memory.read_value(address, value_type) {
                Ok(value) => Some(value),
                Err(e) => {
                    trace!("{}: attempt {} read failed: {}", name, attempt + 1, e);
                    None
                }
            }
        });
        if result.is_none() {
            self.degraded(name);
        }
        result
    }

    /// Resolve `chain` to its final address without reading it
    pub fn update_address<M: ReadMemory + ?Sized>(
        &self,
        memory: &M,
        chain: &PointerChain,
        name: &str,
    ) -> Option<u64> {
        let result = self.locate(memory, chain);
        if result.is_none() {
            self.degraded(name);
        }
        result
    }

    /// Like [`PointerResolver::update_address`] but without the degradation
    /// warning, for callers that poll
    pub fn locate<M: ReadMemory + ?Sized>(&self, memory: &M, chain: &PointerChain) -> Option<u64> {
        let base = chain.base.unwrap_or_else(|| memory.base_address());
        self.policy
            .run(self.sleeper.as_ref(), |_| walk(memory, base, &chain.offsets))
    }

    fn degraded(&self, name: &str) {
        warn!(
            "Could not resolve {} after {} attempts",
            name,
            self.policy.max_attempts()
        );
    }
}

impl Default for PointerResolver {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Arc::new(ThreadSleeper))
    }
}

impl std::fmt::Debug for PointerResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerResolver")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Single walk of `offsets` from `base`; `None` on any invalid link
fn walk<M: ReadMemory + ?Sized>(memory: &M, base: u64, offsets: &[i64]) -> Option<u64> {
    let (last, links) = offsets.split_last()?;
    let mut address = base;
    for offset in links {
        let slot = address.wrapping_add_signed(*offset);
        address = match memory.read_u64(slot) {
            Ok(0) | Ok(u64::MAX) => {
                trace!("null link at {:#x}", slot);
                return None;
            }
            Ok(pointer) => pointer,
            Err(e) => {
                trace!("unreadable link at {:#x}: {}", slot, e);
                return None;
            }
        };
    }
    Some(address.wrapping_add_signed(*last))
}
