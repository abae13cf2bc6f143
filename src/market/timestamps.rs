use alloy_primitives::U256;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::fmt;

/// Market lifecycle times in Unix seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamps {
    /// 0 means the market opens as soon as it is created
    pub opening: u64,
    pub locking: u64,
    pub resolution: u64,
}

impl Timestamps {
    pub fn new(opening: u64, locking: u64, resolution: u64) -> Self {
        Self {
            opening,
            locking,
            resolution,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.opening <= self.locking && self.locking <= self.resolution
    }

    /// ABI shape for the `uint256[3]` argument.
    pub fn to_abi(&self) -> [U256; 3] {
        [
            U256::from(self.opening),
            U256::from(self.locking),
            U256::from(self.resolution),
        ]
    }
}

impl fmt::Display for Timestamps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |ts: u64| match ts {
            0 => "immediately".to_string(),
            _ => DateTime::<Utc>::from_timestamp(ts as i64, 0)
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| ts.to_string()),
        };
        write!(
            f,
            "open {} / lock {} / resolve {}",
            show(self.opening),
            show(self.locking),
            show(self.resolution)
        )
    }
}

/// Parse a time given either as Unix seconds or as an RFC 3339 date.
pub fn parse_time(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }

    let dt = DateTime::parse_from_rfc3339(s).map_err(|e| anyhow!("Bad timestamp {:?}: {}", s, e))?;
    u64::try_from(dt.timestamp()).map_err(|_| anyhow!("Timestamp before 1970: {}", s))
}
