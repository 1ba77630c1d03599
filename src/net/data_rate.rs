//! Data rates with ns-style unit strings (`5Mbps`, `100Mbps`, `1Gbps`).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::sim::SimTime;

/// Bit rate in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataRate(pub u64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataRateError {
    #[error("empty data rate")]
    Empty,
    #[error("invalid number in data rate `{0}`")]
    InvalidNumber(String),
    #[error("unknown data rate unit `{0}`")]
    UnknownUnit(String),
    #[error("data rate `{0}` does not fit in 64 bits")]
    Overflow(String),
}

impl DataRate {
    pub fn from_mbps(mbps: u64) -> Self {
        DataRate(mbps.saturating_mul(1_000_000))
    }

    pub fn bps(self) -> u64 {
        self.0
    }

    /// Serialization time of `bytes` at this rate, rounded up to the next nanosecond.
    pub fn tx_time(self, bytes: u32) -> SimTime {
        if self.0 == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.0 as u128 - 1)) / self.0 as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}

impl FromStr for DataRate {
    type Err = DataRateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(DataRateError::Empty);
        }
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (num, unit) = s.split_at(split);
        let value: f64 = num
            .parse()
            .map_err(|_| DataRateError::InvalidNumber(raw.to_string()))?;
        let mult: f64 = match unit {
            "" | "bps" | "b/s" => 1.0,
            "kbps" | "Kbps" | "kb/s" => 1e3,
            "Mbps" | "mbps" | "Mb/s" => 1e6,
            "Gbps" | "gbps" | "Gb/s" => 1e9,
            "Bps" | "B/s" => 8.0,
            "KBps" | "kBps" | "KB/s" => 8e3,
            "MBps" | "MB/s" => 8e6,
            "GBps" | "GB/s" => 8e9,
            other => return Err(DataRateError::UnknownUnit(other.to_string())),
        };
        let bps = (value * mult).round();
        if bps >= u64::MAX as f64 {
            return Err(DataRateError::Overflow(raw.to_string()));
        }
        Ok(DataRate(bps as u64))
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bps = self.0;
        if bps != 0 && bps % 1_000_000_000 == 0 {
            write!(f, "{}Gbps", bps / 1_000_000_000)
        } else if bps != 0 && bps % 1_000_000 == 0 {
            write!(f, "{}Mbps", bps / 1_000_000)
        } else if bps != 0 && bps % 1_000 == 0 {
            write!(f, "{}kbps", bps / 1_000)
        } else {
            write!(f, "{}bps", bps)
        }
    }
}
