//! Human-readable size strings and environment-driven buffer sizing.
//!
//! Sizes are written as `"<quantity> <unit>"` with binary units
//! (`KB == 1024 B`). The unit is case-insensitive; the two fields must be
//! separated by whitespace.

use std::env;
use std::fmt;

/// Errors from [`parse_size`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SizeParseError {
    /// Input is not `"<integer> <unit>"`.
    Malformed,
    /// The unit is not one of `B, KB, MB, GB, TB, PB, EB`.
    UnknownUnit { unit: String },
    /// The size does not fit in `usize` on this platform.
    Overflow,
}

impl fmt::Display for SizeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "expected \"<quantity> <unit>\""),
            Self::UnknownUnit { unit } => write!(f, "undefined size unit {unit:?}"),
            Self::Overflow => write!(f, "size overflows usize"),
        }
    }
}

impl std::error::Error for SizeParseError {}

/// Parses `"1 MB"`-style size strings into bytes.
///
/// Units are binary powers of 1024 from `B` up to `EB`. Sizes that do not
/// fit the platform's `usize` are rejected rather than wrapped.
pub fn parse_size(input: &str) -> Result<usize, SizeParseError> {
    let mut fields = input.split_whitespace();
    let quantity = fields.next().ok_or(SizeParseError::Malformed)?;
    let unit = fields.next().ok_or(SizeParseError::Malformed)?;
    if fields.next().is_some() {
        return Err(SizeParseError::Malformed);
    }

    let quantity: usize = quantity.parse().map_err(|_| SizeParseError::Malformed)?;
    let shift = match unit.to_ascii_uppercase().as_str() {
        "B" => 0u32,
        "KB" => 10,
        "MB" => 20,
        "GB" => 30,
        "TB" => 40,
        "PB" => 50,
        "EB" => 60,
        _ => {
            return Err(SizeParseError::UnknownUnit {
                unit: unit.to_owned(),
            })
        }
    };

    1usize
        .checked_shl(shift)
        .and_then(|scale| quantity.checked_mul(scale))
        .ok_or(SizeParseError::Overflow)
}

/// Ring sizing knobs: initial capacity, growth ceiling, and the capacity at
/// which growth switches from doubling to 25% steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    pub initial: usize,
    pub maximum: usize,
    pub grow_threshold: usize,
}

impl Default for BufferSizes {
    /// 1 MB initial, 5 MB maximum, doubling below 2 MB.
    fn default() -> Self {
        Self {
            initial: 1 << 20,
            maximum: 5 << 20,
            grow_threshold: 2 << 20,
        }
    }
}

impl BufferSizes {
    /// Reads sizes from `DEFAULT_BUFFER_SIZE`, `MAXIMUM_BUFFER_SIZE` and
    /// `EXTEND_COEFFICIENT`; each variable falls back to its default when
    /// unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            initial: env_size("DEFAULT_BUFFER_SIZE").unwrap_or(defaults.initial),
            maximum: env_size("MAXIMUM_BUFFER_SIZE").unwrap_or(defaults.maximum),
            grow_threshold: env_size("EXTEND_COEFFICIENT").unwrap_or(defaults.grow_threshold),
        }
    }
}

fn env_size(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|value| parse_size(&value).ok())
}
