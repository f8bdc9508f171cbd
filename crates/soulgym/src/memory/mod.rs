pub mod layout;
mod process;
mod reader;
pub mod value;

#[cfg(test)]
pub mod mock;

pub use process::ProcessHandle;
pub use reader::{Attach, MemoryAccessor, ProcessAttacher, ProcessMemory, ReadMemory, WriteMemory};
pub use value::{STRING_LEN, Value, ValueType};

#[cfg(test)]
pub use mock::{MockAttacher, MockMemory};
