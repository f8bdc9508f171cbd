use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::memory::{ReadMemory, Value, WriteMemory};
use crate::pointer::{PointerChain, PointerResolver};

/// Rewrites one pointer-chain value at a fixed interval on a worker thread
///
/// The chain is resolved again before every write, so the freezer follows
/// the structure when the game reallocates it. Iterations where the chain
/// does not resolve write nothing.
pub struct ValueFreezer {
    name: String,
    value: Value,
    running: Arc<AtomicBool>,
    writes: Arc<AtomicU64>,
    /// Last resolved address, 0 when none yet
    address: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl ValueFreezer {
    pub fn start<M>(
        memory: Arc<M>,
        resolver: PointerResolver,
        chain: PointerChain,
        name: &str,
        value: Value,
        interval: Duration,
    ) -> Self
    where
        M: ReadMemory + WriteMemory + Send + Sync + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let writes = Arc::new(AtomicU64::new(0));
        let address = Arc::new(AtomicU64::new(0));

        let worker = {
            let running = Arc::clone(&running);
            let writes = Arc::clone(&writes);
            let last_address = Arc::clone(&address);
            let value = value.clone();
            let name = name.to_string();
            thread::spawn(move || {
                let mut failing = false;
                while running.load(Ordering::SeqCst) {
                    match resolver.locate(memory.as_ref(), &chain) {
                        Some(address) => {
                            if last_address.swap(address, Ordering::Relaxed) != address {
                                debug!("{} now at {:#x}", name, address);
                            }
                            match memory.write_value(address, &value) {
                                Ok(()) => {
                                    writes.fetch_add(1, Ordering::Relaxed);
                                    failing = false;
                                }
                                Err(e) if !failing => {
                                    warn!("Freeze write to {} failed: {}", name, e);
                                    failing = true;
                                }
                                Err(e) => debug!("Freeze write still failing: {}", e),
                            }
                        }
                        None if !failing => {
                            warn!("{} did not resolve, skipping writes", name);
                            failing = true;
                        }
                        None => {}
                    }
                    thread::sleep(interval);
                }
            })
        };

        info!("Freezing {} at {} every {:?}", name, value, interval);
        Self {
            name: name.to_string(),
            value,
            running,
            writes,
            address,
            worker: Some(worker),
        }
    }

    /// Address of the most recent resolution
    pub fn address(&self) -> Option<u64> {
        match self.address.load(Ordering::Relaxed) {
            0 => None,
            address => Some(address),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Successful writes so far
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Stop the worker and wait for its current interval to end
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Freeze worker panicked");
            }
            info!("Unfroze {} after {} writes", self.name, self.writes());
        }
    }
}

impl Drop for ValueFreezer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemory, ValueType};
    use crate::retry::{RetryPolicy, VirtualClock};
    use std::time::Instant;

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached");
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Health behind one pointer: `[0x10] + 0x90`
    fn health_memory() -> (MockMemory, PointerChain) {
        let memory = MockMemory::new(0);
        memory.set_u64(0x10, 0x5000);
        memory.set_i32(0x5090, 454);
        (memory, PointerChain::new(vec![0x10, 0x90], ValueType::I32))
    }

    fn start(memory: &MockMemory, chain: PointerChain, value: Value) -> ValueFreezer {
        let resolver = PointerResolver::new(RetryPolicy::none(), Arc::new(VirtualClock::new()));
        ValueFreezer::start(
            Arc::new(memory.clone()),
            resolver,
            chain,
            "player_health",
            value,
            Duration::from_millis(1),
        )
    }

    #[test]
    fn test_freezer_rewrites_until_stopped() {
        let (memory, chain) = health_memory();
        let mut freezer = start(&memory, chain, Value::I32(999));

        wait_for(|| freezer.writes() >= 3);
        assert_eq!(memory.get_i32(0x5090), 999);
        assert_eq!(freezer.address(), Some(0x5090));

        // Game overwrites; the freezer puts it back
        memory.set_i32(0x5090, 10);
        let seen = freezer.writes();
        wait_for(|| freezer.writes() > seen);
        assert_eq!(memory.get_i32(0x5090), 999);

        freezer.stop();
        assert!(!freezer.is_running());
        memory.set_i32(0x5090, 10);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(memory.get_i32(0x5090), 10);
    }

    #[test]
    fn test_freezer_follows_moved_structure() {
        let (memory, chain) = health_memory();
        let mut freezer = start(&memory, chain, Value::I32(999));
        wait_for(|| memory.get_i32(0x5090) == 999);

        // Structure reallocated; the old slot now belongs to something else
        memory.set_i32(0x9090, 454);
        memory.set_u64(0x10, 0x9000);
        wait_for(|| memory.get_i32(0x9090) == 999);

        memory.set_i32(0x5090, 454);
        let seen = freezer.writes();
        wait_for(|| freezer.writes() > seen + 2);
        assert_eq!(memory.get_i32(0x5090), 454);
        assert_eq!(freezer.address(), Some(0x9090));
        freezer.stop();
    }

    #[test]
    fn test_freezer_skips_unresolved_chain() {
        let (memory, chain) = health_memory();
        memory.set_u64(0x10, 0);
        let mut freezer = start(&memory, chain, Value::I32(999));
        thread::sleep(Duration::from_millis(10));
        assert_eq!(freezer.writes(), 0);
        assert_eq!(freezer.address(), None);
        assert!(freezer.is_running());

        memory.set_u64(0x10, 0x5000);
        wait_for(|| memory.get_i32(0x5090) == 999);
        freezer.stop();
    }

    #[test]
    fn test_freezer_survives_write_failures() {
        let (memory, chain) = health_memory();
        memory.set_read_only(true);
        let mut freezer = start(&memory, chain, Value::Byte(1));
        thread::sleep(Duration::from_millis(10));
        assert_eq!(freezer.writes(), 0);
        assert!(freezer.is_running());
        freezer.stop();
    }
}
