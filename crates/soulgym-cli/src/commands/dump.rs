//! Dump command implementation.

use anyhow::Result;
use soulgym::debug::MemoryDump;
use soulgym::{Attach, Config, ProcessAttacher, ReadMemory};

use super::address::{AddressExpr, format_address};

pub fn run(config: &Config, address: &str, size: usize, floats: bool) -> Result<()> {
    let expr = AddressExpr::parse(address)?;
    let memory = ProcessAttacher.attach(&config.process.name)?;
    let address = expr.resolve(memory.base_address());
    let dump = MemoryDump::read(&memory, address, size)?;

    println!("Dump at {} ({} bytes):", format_address(address), size);
    println!();
    let lines = if floats {
        dump.word_lines()
    } else {
        dump.hex_lines(true)
    };
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
