//! Error types for descriptor batch parsing.

/// Error type for batch parsing operations.
///
/// Every variant is a protocol violation. The host hands over whole batches,
/// so there is no incomplete/retry case: a batch that does not parse is
/// fatal to the chain it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Batch ended before the declared records or filename bytes.
    #[error("truncated batch: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    /// Declared record count cannot fit in any addressable batch.
    #[error("record count overflows the batch: {0}")]
    RecordCount(u64),

    /// Filename bytes are not valid UTF-8.
    #[error("filename is not valid utf-8")]
    BadFilename,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            format!("{}", WireError::Truncated { needed: 24, have: 8 }),
            "truncated batch: need 24 bytes, have 8"
        );
        assert_eq!(
            format!("{}", WireError::RecordCount(u64::MAX)),
            format!("record count overflows the batch: {}", u64::MAX)
        );
        assert_eq!(
            format!("{}", WireError::BadFilename),
            "filename is not valid utf-8"
        );
    }

    #[test]
    fn error_eq() {
        assert_eq!(
            WireError::Truncated { needed: 1, have: 0 },
            WireError::Truncated { needed: 1, have: 0 }
        );
        assert_ne!(
            WireError::Truncated { needed: 1, have: 0 },
            WireError::BadFilename
        );
    }
}
