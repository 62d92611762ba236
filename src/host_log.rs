use std::slice;

use crate::ping::ProbeResult;

/// Append-only log of probe outcomes for a single host, in probe-issue order.
///
/// Entries are never removed or reordered, so the length only grows. There is
/// no eviction: a run of `n` ticks keeps `n` entries per host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostLog {
    entries: Vec<ProbeResult>,
}

impl HostLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ProbeResult) {
        self.entries.push(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ProbeResult] {
        &self.entries
    }

    pub fn iter(&self) -> slice::Iter<'_, ProbeResult> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a HostLog {
    type Item = &'a ProbeResult;
    type IntoIter = slice::Iter<'a, ProbeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<ProbeResult> for HostLog {
    fn from_iter<I: IntoIterator<Item = ProbeResult>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
