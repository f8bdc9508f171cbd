use serde::Serialize;

use crate::error::Result;
use crate::memory::ReadMemory;

const ROW: usize = 16;

/// A block of raw memory read in one go
#[derive(Debug, Clone, Serialize)]
pub struct MemoryDump {
    pub address: u64,
    pub bytes: Vec<u8>,
}

impl MemoryDump {
    pub fn read<M: ReadMemory + ?Sized>(memory: &M, address: u64, size: usize) -> Result<Self> {
        Ok(Self {
            address,
            bytes: memory.read_bytes(address, size)?,
        })
    }

    /// Classic hexdump rows:
    ///
    /// ```text
    /// 0x000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
    /// ```
    pub fn hex_lines(&self, ascii: bool) -> Vec<String> {
        self.bytes
            .chunks(ROW)
            .enumerate()
            .map(|(i, chunk)| {
                let mut line = format!("0x{:03X}: ", i * ROW);
                for j in 0..ROW {
                    if j == 8 {
                        line.push(' ');
                    }
                    match chunk.get(j) {
                        Some(byte) => line.push_str(&format!("{:02X} ", byte)),
                        None => line.push_str("   "),
                    }
                }
                if ascii {
                    line.push_str(" |");
                    for j in 0..ROW {
                        line.push(match chunk.get(j) {
                            Some(b) if (0x20..0x7F).contains(b) => *b as char,
                            Some(_) => '.',
                            None => ' ',
                        });
                    }
                    line.push('|');
                }
                line
            })
            .collect()
    }

    /// One row per aligned 4-byte word: offset, address, raw, i32 and f32 views
    pub fn word_lines(&self) -> Vec<String> {
        self.bytes
            .chunks_exact(4)
            .enumerate()
            .map(|(i, word)| {
                let raw = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                let offset = i * 4;
                format!(
                    "+0x{:03X}  0x{:X}  {:08X}  {:>11}  {}",
                    offset,
                    self.address + offset as u64,
                    raw,
                    raw as i32,
                    format_f32(f32::from_bits(raw))
                )
            })
            .collect()
    }
}

/// Floats outside a plausible game range are shown as `-`
fn format_f32(value: f32) -> String {
    if value.is_finite() && (value == 0.0 || (1e-4..1e7).contains(&value.abs())) {
        format!("{:.4}", value)
    } else {
        "-".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemory;

    #[test]
    fn test_hex_lines_pad_short_rows() {
        let dump = MemoryDump {
            address: 0x1000,
            bytes: b"Hello World\0".to_vec(),
        };
        let lines = dump.hex_lines(true);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("0x000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 "));
        assert!(lines[0].ends_with("|Hello World.    |"));
    }

    #[test]
    fn test_word_lines_decode_floats() {
        let memory = MockMemory::new(0);
        memory.set_f32(0x2000, 124.5);
        memory.set_i32(0x2004, 454);
        let dump = MemoryDump::read(&memory, 0x2000, 8).unwrap();

        let lines = dump.word_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("124.5000"));
        assert!(lines[1].contains("454"));
        assert!(lines[1].ends_with('-'));
    }

    #[test]
    fn test_unmapped_read_fails() {
        let memory = MockMemory::new(0);
        assert!(MemoryDump::read(&memory, 0x9000, 4).is_err());
    }
}
