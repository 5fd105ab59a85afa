use std::collections::BTreeMap;
use std::fmt;

/// Error class recorded when a request produced no HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum FailureKind {
    Timeout,
    ConnectionRefused,
    ProtocolError,
    Other,
}

impl FailureKind {
    pub(crate) fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::ConnectionRefused
        } else if err.is_request() || err.is_body() || err.is_decode() {
            FailureKind::ProtocolError
        } else {
            FailureKind::Other
        }
    }

    #[must_use]
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ConnectionRefused => "connection refused",
            FailureKind::ProtocolError => "protocol error",
            FailureKind::Other => "error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one request: any HTTP response counts as `Status`, including
/// 4xx/5xx; `Failed` means no response was obtained at all.
///
/// Ordering puts statuses (numeric) before failure kinds, which keeps
/// tally iteration in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Outcome {
    Status(u16),
    Failed(FailureKind),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Outcome::Status(status) => write!(f, "Response {}", status),
            Outcome::Failed(kind) => write!(f, "Response {}", kind),
        }
    }
}

/// Per-outcome counts for one batch. Only the aggregation loop writes to
/// it, so updates are serialized by construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tally(BTreeMap<Outcome, u64>);

impl Tally {
    pub(crate) fn record(&mut self, outcome: Outcome) {
        self.0
            .entry(outcome)
            .and_modify(|count| *count = count.saturating_add(1))
            .or_insert(1);
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn total(&self) -> u64 {
        self.0
            .values()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn count(&self, outcome: Outcome) -> u64 {
        self.0.get(&outcome).copied().unwrap_or(0)
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Outcome, u64)> + '_ {
        self.0.iter().map(|(outcome, count)| (*outcome, *count))
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (outcome, count) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", outcome, count)?;
            first = false;
        }
        Ok(())
    }
}
