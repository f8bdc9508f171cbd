use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ProcessHandle;
use crate::memory::value::{STRING_LEN, Value, ValueType};

/// Trait for reading memory from a process
///
/// This abstraction allows for testing without an actual process.
pub trait ReadMemory {
    /// Read raw bytes from the specified address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Base address of the main module
    fn base_address(&self) -> u64;

    fn read_u8(&self, address: u64) -> Result<u8> {
        let buffer = self.read_bytes(address, 1)?;
        Ok(buffer[0])
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let buffer = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let buffer = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let buffer = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes([
            buffer[0], buffer[1], buffer[2], buffer[3], buffer[4], buffer[5], buffer[6],
            buffer[7],
        ]))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        self.read_u32(address).map(f32::from_bits)
    }

    fn read_f64(&self, address: u64) -> Result<f64> {
        self.read_u64(address).map(f64::from_bits)
    }

    /// Read a fixed-length NUL-terminated string
    fn read_string(&self, address: u64) -> Result<String> {
        match self.read_value(address, ValueType::String)? {
            Value::String(s) => Ok(s),
            other => Err(Error::MemoryReadFailed {
                address,
                message: format!("expected string, decoded {}", other.value_type()),
            }),
        }
    }

    fn read_value(&self, address: u64, value_type: ValueType) -> Result<Value> {
        let buffer = self.read_bytes(address, value_type.size())?;
        Value::decode(value_type, &buffer).map_err(|_| Error::MemoryReadFailed {
            address,
            message: format!("short read for {}", value_type),
        })
    }
}

/// Trait for writing memory into a process
pub trait WriteMemory {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()>;

    fn write_value(&self, address: u64, value: &Value) -> Result<()> {
        self.write_bytes(address, &value.to_bytes())
    }
}

/// Full access to a live process
pub trait ProcessMemory: ReadMemory + WriteMemory {
    /// Whether the target process is still running
    fn is_alive(&self) -> bool;
}

/// Opens a [`ProcessMemory`] for a process name
pub trait Attach {
    type Memory: ProcessMemory;

    fn attach(&self, process_name: &str) -> Result<Self::Memory>;
}

/// Memory accessor over an opened process handle
pub struct MemoryAccessor {
    process: ProcessHandle,
}

impl MemoryAccessor {
    pub fn new(process: ProcessHandle) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &ProcessHandle {
        &self.process
    }

    pub fn pid(&self) -> u32 {
        self.process.pid
    }
}

impl ReadMemory for MemoryAccessor {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.process.read_bytes(address, size)
    }

    fn base_address(&self) -> u64 {
        self.process.base_address
    }
}

impl WriteMemory for MemoryAccessor {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        self.process.write_bytes(address, bytes)
    }
}

impl ProcessMemory for MemoryAccessor {
    fn is_alive(&self) -> bool {
        self.process.is_alive()
    }
}

/// Production attacher: finds the process by name and opens it
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessAttacher;

impl Attach for ProcessAttacher {
    type Memory = MemoryAccessor;

    fn attach(&self, process_name: &str) -> Result<MemoryAccessor> {
        let process = ProcessHandle::find_by_name(process_name)?;
        debug!(
            "Opened {} (pid {}, base {:#x})",
            process.name, process.pid, process.base_address
        );
        Ok(MemoryAccessor::new(process))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mock::MockMemory;

    #[test]
    fn test_typed_reads() {
        let memory = MockMemory::new(0x1000);
        memory.set_i32(0x2000, -454);
        memory.set_f32(0x2010, 124.45);
        memory.set_u64(0x2020, 0xDEAD_BEEF_0000);
        memory.set_u8(0x2030, 0x80);

        assert_eq!(memory.read_i32(0x2000).unwrap(), -454);
        assert_eq!(memory.read_f32(0x2010).unwrap(), 124.45);
        assert_eq!(memory.read_u64(0x2020).unwrap(), 0xDEAD_BEEF_0000);
        assert_eq!(memory.read_u8(0x2030).unwrap(), 0x80);
    }

    #[test]
    fn test_read_string_and_value() {
        let memory = MockMemory::new(0x1000);
        let mut name = b"Iudex".to_vec();
        name.resize(STRING_LEN, 0);
        memory.set_bytes(0x3000, &name);
        assert_eq!(memory.read_string(0x3000).unwrap(), "Iudex");
        assert_eq!(
            memory.read_value(0x3000, ValueType::Byte).unwrap(),
            Value::Byte(b'I')
        );
    }

    #[test]
    fn test_unmapped_read_fails() {
        let memory = MockMemory::new(0x1000);
        let err = memory.read_i32(0x9999).unwrap_err();
        assert!(matches!(err, Error::MemoryReadFailed { address: 0x9999, .. }));
    }

    #[test]
    fn test_write_value_round_trips_through_reads() {
        let memory = MockMemory::new(0x1000);
        memory
            .write_value(0x4000, &Value::F32(-2.778_103_4))
            .unwrap();
        assert_eq!(memory.read_f32(0x4000).unwrap(), -2.778_103_4);
        assert_eq!(memory.writes().len(), 1);
    }
}
