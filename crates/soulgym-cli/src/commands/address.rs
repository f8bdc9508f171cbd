//! Address expressions for the inspection commands.
//!
//! Accepts the notation `resolve` prints for pointer chains: an absolute
//! address (`0x1445A2F60`), or an offset from the main module base
//! (`base+0x4543F60`, `base-0x10`).

use anyhow::{Result, anyhow, bail};

/// Address given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressExpr {
    Absolute(u64),
    /// Signed offset from the main module base
    BaseRelative(i64),
}

impl AddressExpr {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let lower = text.to_ascii_lowercase();
        match lower.strip_prefix("base") {
            Some("") => Ok(Self::BaseRelative(0)),
            Some(rest) => {
                if !rest.starts_with(['+', '-']) {
                    bail!("Expected base+<offset> or base-<offset>, got {:?}", text);
                }
                parse_offset(rest).map(Self::BaseRelative)
            }
            None => parse_unsigned(&lower)
                .map(Self::Absolute)
                .ok_or_else(|| anyhow!("Invalid address {:?}", text)),
        }
    }

    /// Absolute address given the module base
    pub fn resolve(&self, base: u64) -> u64 {
        match *self {
            Self::Absolute(address) => address,
            Self::BaseRelative(offset) => base.wrapping_add_signed(offset),
        }
    }
}

/// Parse a chain offset as printed by `resolve`: `+0x28`, `-0xC` or `0x28`
pub fn parse_offset(text: &str) -> Result<i64> {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_unsigned(&digits.to_ascii_lowercase())
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(|| anyhow!("Invalid offset {:?}", text))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Hex with an optional `0x` prefix; digits are always hex
fn parse_unsigned(text: &str) -> Option<u64> {
    let digits = text.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

pub fn format_address(address: u64) -> String {
    format!("0x{:X}", address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_addresses() {
        assert_eq!(
            AddressExpr::parse("0x144543F60").unwrap(),
            AddressExpr::Absolute(0x1_4454_3F60)
        );
        assert_eq!(
            AddressExpr::parse("7ff61234").unwrap(),
            AddressExpr::Absolute(0x7FF6_1234)
        );
        assert!(AddressExpr::parse("0x").is_err());
        assert!(AddressExpr::parse("player").is_err());
    }

    #[test]
    fn test_base_relative_addresses() {
        let base = 0x1_4000_0000;
        let expr = AddressExpr::parse("base+0x4543F60").unwrap();
        assert_eq!(expr, AddressExpr::BaseRelative(0x454_3F60));
        assert_eq!(expr.resolve(base), 0x1_4454_3F60);

        let expr = AddressExpr::parse("BASE-0x10").unwrap();
        assert_eq!(expr.resolve(base), 0x1_3FFF_FFF0);
        assert_eq!(AddressExpr::parse("base").unwrap().resolve(base), base);
        assert!(AddressExpr::parse("base0x10").is_err());
    }

    #[test]
    fn test_chain_offsets() {
        assert_eq!(parse_offset("+0x28").unwrap(), 0x28);
        assert_eq!(parse_offset("-0xc").unwrap(), -0xC);
        assert_eq!(parse_offset("A35").unwrap(), 0xA35);
        assert!(parse_offset("-").is_err());
        assert!(parse_offset("+0xFFFFFFFFFFFFFFFF").is_err());
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0x1_4454_3F60), "0x144543F60");
        assert_eq!(format_address(0), "0x0");
    }
}
