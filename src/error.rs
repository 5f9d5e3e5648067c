//! Error types for rssdepot.

use thiserror::Error;

/// Source-level failure taxonomy for the fetch/extract pipeline.
///
/// Item-level malformation never surfaces here: extractors log and skip bad
/// candidates. What remains is the set of failures a caller can act on —
/// the scheduler skips the source for a cycle, the request path turns them
/// into a 503 page.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The upstream site could not be fetched: connection error, timeout or
    /// a non-2xx response.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The anti-bot relay itself is unreachable. Kept distinct from
    /// [`FeedError::SourceUnavailable`] because it means our infrastructure,
    /// not the target site, is down and the fix is different.
    #[error("anti-bot relay unavailable: {0}")]
    RelayUnavailable(String),

    /// Whole-payload structural failure: relay envelope missing its expected
    /// key, a JSON body that stays broken after repair, and the like.
    #[error("malformed upstream payload: {0}")]
    MalformedPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_display() {
        let err = FeedError::SourceUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "source unavailable: connection refused");
    }

    #[test]
    fn relay_unavailable_display() {
        let err = FeedError::RelayUnavailable("timed out".to_string());
        assert_eq!(err.to_string(), "anti-bot relay unavailable: timed out");
    }

    #[test]
    fn malformed_payload_display() {
        let err = FeedError::MalformedPayload("missing solution.response".to_string());
        assert!(err.to_string().contains("missing solution.response"));
    }
}
