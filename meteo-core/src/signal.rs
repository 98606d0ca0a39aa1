//! Wireless signal strength, sampled when a fetch fails.

use std::{fmt::Debug, fs};

pub trait SignalProbe: Send + Sync + Debug {
    /// Current received signal strength in dBm, if there is a wireless link.
    fn rssi_dbm(&self) -> Option<i32>;
}

/// Reads the first interface listed in `/proc/net/wireless`.
#[derive(Debug, Clone, Default)]
pub struct ProcWireless;

impl ProcWireless {
    const PATH: &'static str = "/proc/net/wireless";
}

impl SignalProbe for ProcWireless {
    fn rssi_dbm(&self) -> Option<i32> {
        let contents = fs::read_to_string(Self::PATH).ok()?;
        parse_proc_wireless(&contents)
    }
}

/// A constant reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSignal(pub Option<i32>);

impl SignalProbe for FixedSignal {
    fn rssi_dbm(&self) -> Option<i32> {
        self.0
    }
}

// Two header lines, then `iface: status link level noise ...`; values may carry a trailing '.'.
fn parse_proc_wireless(contents: &str) -> Option<i32> {
    let line = contents.lines().skip(2).find(|l| l.contains(':'))?;
    let (_, fields) = line.split_once(':')?;
    let level = fields.split_whitespace().nth(2)?;
    let dbm: f64 = level.trim_end_matches('.').parse().ok()?;
    Some(dbm as i32)
}
