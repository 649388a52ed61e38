//! Warning taxonomy for conditions that drop data from the graph
//!
//! Nothing in the pipeline is fatal once input can be read: malformed rows
//! and bundles with unparseable versions or skip-ranges are dropped and
//! reported, and rendering proceeds with the valid remainder.

use thiserror::Error;

/// A non-fatal condition encountered while accumulating or resolving the
/// catalog. Each variant corresponds to data that will be missing from the
/// rendered graph.
#[derive(Error, Debug)]
pub enum GraphWarning {
    /// An input row with fewer than the expected number of fields
    #[error("malformed row at line {line}: expected {expected} {delimiter:?}-separated fields, found {found} -- row skipped")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
        delimiter: char,
    },

    /// A bundle declared a skip-range that is not a valid semver range
    #[error("invalid skip range {range:?} for bundle {bundle:?}: {source} -- bundle will not appear in graph")]
    InvalidSkipRange {
        bundle: String,
        range: String,
        source: anyhow::Error,
    },

    /// A bundle carries a version that is not a valid semantic version
    #[error("invalid version {version:?} for bundle {bundle:?}: {source} -- bundle will not appear in graph")]
    InvalidVersion {
        bundle: String,
        version: String,
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_malformed_row_message() {
        let warning = GraphWarning::MalformedRow {
            line: 3,
            expected: 7,
            found: 2,
            delimiter: '|',
        };
        let message = warning.to_string();
        assert!(message.contains("line 3"));
        assert!(message.contains("found 2"));
        assert!(message.contains("row skipped"));
    }

    #[test]
    fn test_invalid_skip_range_message() {
        let warning = GraphWarning::InvalidSkipRange {
            bundle: "etcd.v0.9.2".to_string(),
            range: "not-a-range".to_string(),
            source: anyhow!("unexpected character"),
        };
        let message = warning.to_string();
        assert!(message.contains("\"not-a-range\""));
        assert!(message.contains("\"etcd.v0.9.2\""));
        assert!(message.contains("will not appear in graph"));
    }
}
