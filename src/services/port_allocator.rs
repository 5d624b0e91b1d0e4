use std::collections::HashSet;
use crate::errors::{ProvisionError, ProvisionResult};

/// Inclusive range of host ports handed out to relay containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    from: u16,
    to: u16,
}

impl PortRange {
    pub fn new(from: u16, to: u16) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> u16 {
        self.from
    }

    pub fn to(&self) -> u16 {
        self.to
    }
}

/// Returns the lowest port of `range` that is not in `used`.
pub fn allocate_port(used: &[u16], range: PortRange) -> ProvisionResult<u16> {
    let used: HashSet<u16> = used.iter().copied().collect();
    (range.from..=range.to)
        .find(|port| !used.contains(port))
        .ok_or(ProvisionError::NoAvailablePort {
            from: range.from,
            to: range.to,
        })
}
