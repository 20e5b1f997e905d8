use thiserror::Error;

/// Error types.
#[derive(Debug, Error)]
pub enum Error {
    #[cfg(test)]
    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    #[error("{parameter} out of valid range: {value}")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: i64,
    },

    #[error("unknown {parameter}: {value:?}")]
    UnknownParameter {
        parameter: &'static str,
        value: String,
    },

    #[error("frame contains a terminator byte before its end")]
    InvalidFrame,

    #[error("invalid reply length")]
    InvalidLength,

    #[error("reply does not answer an inquiry")]
    UnexpectedReply,

    #[error("data parse error: {0}")]
    BinRwError(#[from] binrw::Error),
}

impl Error {
    /// `true` if the error was caused by a bad argument to an encoder, rather
    /// than by data on the wire.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Error::ParameterOutOfRange { .. } | Error::UnknownParameter { .. }
        )
    }

    pub(crate) fn out_of_range(parameter: &'static str, value: impl Into<i64>) -> Self {
        Error::ParameterOutOfRange {
            parameter,
            value: value.into(),
        }
    }
}
