use crate::marshal::AbiEnum;

crate::abi_enum! {
    /// Failure codes carried by a failure envelope.
    ///
    /// The set is closed; values are part of the ABI and only ever appended.
    #[derive(thiserror::Error)]
    pub enum ErrorCode {
        /// A panic was caught at the boundary.
        #[error("internal failure")]
        Unknown = 0,
        #[error("required data not found")]
        DataNotFound = 1,
        #[error("invalid argument")]
        InvalidArgument = 2,
        #[error("input could not be parsed")]
        ParseFailure = 3,
        #[error("unsupported option")]
        UnsupportedOption = 4,
        #[error("internal limit exceeded")]
        InternalLimitExceeded = 5,
        /// Null, stale, destroyed or wrong-kind handle.
        #[error("invalid handle")]
        InvalidHandle = 6,
    }
}

impl ErrorCode {
    /// Decodes a raw code read back from a failure envelope. Unknown values
    /// collapse to [`ErrorCode::Unknown`].
    pub fn from_raw(raw: u32) -> Self {
        Self::from_abi(raw).unwrap_or(Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let table: Vec<(u32, &str)> = ErrorCode::ALL
            .iter()
            .map(|c| (c.to_abi(), c.name()))
            .collect();
        assert_eq!(
            table,
            vec![
                (0, "Unknown"),
                (1, "DataNotFound"),
                (2, "InvalidArgument"),
                (3, "ParseFailure"),
                (4, "UnsupportedOption"),
                (5, "InternalLimitExceeded"),
                (6, "InvalidHandle"),
            ]
        );
    }

    #[test]
    fn display_comes_from_thiserror() {
        assert_eq!(ErrorCode::DataNotFound.to_string(), "required data not found");
        assert_eq!(ErrorCode::from_raw(999), ErrorCode::Unknown);
    }
}
