//! In-memory process stand-in for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::memory::{Attach, ProcessMemory, ReadMemory, WriteMemory};

#[derive(Default)]
struct MockState {
    bytes: BTreeMap<u64, u8>,
    /// Remaining reads at an address that report a null pointer
    transient_nulls: HashMap<u64, u32>,
    writes: Vec<(u64, Vec<u8>)>,
    reads: usize,
    dead: bool,
    read_only: bool,
}

/// Sparse byte-addressed memory shared between clones
#[derive(Clone)]
pub struct MockMemory {
    base: u64,
    state: Arc<RwLock<MockState>>,
}

impl MockMemory {
    pub fn new(base: u64) -> Self {
        Self {
            base,
            state: Arc::new(RwLock::new(MockState::default())),
        }
    }

    pub fn set_bytes(&self, address: u64, bytes: &[u8]) {
        let mut state = self.state.write().unwrap();
        for (i, b) in bytes.iter().enumerate() {
            state.bytes.insert(address + i as u64, *b);
        }
    }

    pub fn set_u8(&self, address: u64, value: u8) {
        self.set_bytes(address, &[value]);
    }

    pub fn set_i32(&self, address: u64, value: i32) {
        self.set_bytes(address, &value.to_le_bytes());
    }

    pub fn set_u32(&self, address: u64, value: u32) {
        self.set_bytes(address, &value.to_le_bytes());
    }

    pub fn set_u64(&self, address: u64, value: u64) {
        self.set_bytes(address, &value.to_le_bytes());
    }

    pub fn set_f32(&self, address: u64, value: f32) {
        self.set_bytes(address, &value.to_le_bytes());
    }

    /// Lay out a pointer chain so that walking `offsets` from the base ends
    /// at `target`. Intermediate nodes are placed at `scratch`, 0x1000 apart.
    pub fn set_chain(&self, offsets: &[i64], scratch: u64, target: u64) {
        let mut address = self.base;
        for (i, offset) in offsets.iter().enumerate() {
            let slot = address.wrapping_add_signed(*offset);
            if i == offsets.len() - 1 {
                assert_eq!(slot, target, "last offset must land on the target");
                return;
            }
            let next = if i == offsets.len() - 2 {
                target.wrapping_add_signed(-offsets[offsets.len() - 1])
            } else {
                scratch + 0x1000 * i as u64
            };
            self.set_u64(slot, next);
            address = next;
        }
    }

    /// The next `times` reads at `address` see a null pointer
    pub fn inject_transient_null(&self, address: u64, times: u32) {
        self.state
            .write()
            .unwrap()
            .transient_nulls
            .insert(address, times);
    }

    pub fn kill(&self) {
        self.state.write().unwrap().dead = true;
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.state.write().unwrap().read_only = read_only;
    }

    pub fn writes(&self) -> Vec<(u64, Vec<u8>)> {
        self.state.read().unwrap().writes.clone()
    }

    pub fn read_count(&self) -> usize {
        self.state.read().unwrap().reads
    }

    pub fn get_u8(&self, address: u64) -> u8 {
        self.read_u8(address).unwrap()
    }

    pub fn get_i32(&self, address: u64) -> i32 {
        self.read_i32(address).unwrap()
    }

    pub fn get_f32(&self, address: u64) -> f32 {
        self.read_f32(address).unwrap()
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut state = self.state.write().unwrap();
        state.reads += 1;
        if state.dead {
            return Err(Error::MemoryReadFailed {
                address,
                message: "process exited".into(),
            });
        }
        if let Some(remaining) = state.transient_nulls.get_mut(&address)
            && *remaining > 0
        {
            *remaining -= 1;
            return Ok(vec![0; size]);
        }
        (0..size as u64)
            .map(|i| state.bytes.get(&(address + i)).copied())
            .collect::<Option<Vec<u8>>>()
            .ok_or(Error::MemoryReadFailed {
                address,
                message: "unmapped".into(),
            })
    }

    fn base_address(&self) -> u64 {
        self.base
    }
}

impl WriteMemory for MockMemory {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        {
            let state = self.state.read().unwrap();
            if state.dead || state.read_only {
                return Err(Error::MemoryWriteFailed {
                    address,
                    message: "access denied".into(),
                });
            }
        }
        self.set_bytes(address, bytes);
        self.state
            .write()
            .unwrap()
            .writes
            .push((address, bytes.to_vec()));
        Ok(())
    }
}

impl ProcessMemory for MockMemory {
    fn is_alive(&self) -> bool {
        !self.state.read().unwrap().dead
    }
}

/// Hands out clones of one [`MockMemory`], or fails when no process is set
#[derive(Clone, Default)]
pub struct MockAttacher {
    memory: Arc<RwLock<Option<MockMemory>>>,
    attaches: Arc<RwLock<usize>>,
}

impl MockAttacher {
    pub fn new(memory: MockMemory) -> Self {
        Self {
            memory: Arc::new(RwLock::new(Some(memory))),
            attaches: Arc::new(RwLock::new(0)),
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn replace(&self, memory: Option<MockMemory>) {
        *self.memory.write().unwrap() = memory;
    }

    pub fn attach_count(&self) -> usize {
        *self.attaches.read().unwrap()
    }
}

impl Attach for MockAttacher {
    type Memory = MockMemory;

    fn attach(&self, process_name: &str) -> Result<MockMemory> {
        *self.attaches.write().unwrap() += 1;
        self.memory
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::ProcessNotFound(process_name.to_string()))
    }
}
