// Persistent track identifiers
// The player hands these out as unsigned 64-bit values, but the notification
// bridge delivers them as signed integers, so large ids arrive negative.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Reinterprets a signed value as the unsigned 64-bit id it actually encodes.
///
/// Negative inputs are shifted up by 2^64, which is exactly the two's complement
/// bit pattern read as unsigned.
pub fn to_unsigned64(value: i64) -> u64 {
    value as u64
}

/// Formats an id the way the player reports it: 16 uppercase hex digits.
pub fn format(id: u64) -> String {
    format!("{:016X}", id)
}

/// A player-assigned identifier for a specific track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersistentId(u64);

impl PersistentId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Builds an id from the sign-ambiguous value found in notifications.
    pub fn from_signed(value: i64) -> Self {
        Self(to_unsigned64(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PersistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self.0))
    }
}

/// Parses the hex form reported by the player. Case-insensitive.
impl FromStr for PersistentId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s.trim(), 16).map(Self)
    }
}
