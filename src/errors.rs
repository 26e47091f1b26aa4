use thiserror::Error;

use crate::codec::LayoutError;

/// Failure reported by a collaborator (RPC transport, account parsing on the
/// far side of the adapter). Passed through untouched.
pub type UpstreamError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SquadsError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("invalid allocation type discriminant {value}")]
    InvalidDiscriminant { value: u8 },
    #[error(
        "member region of {populated_len} bytes ends in a truncated {trailing}-byte member record"
    )]
    TruncatedMemberRecord { populated_len: usize, trailing: usize },
    #[error("member region claims {used_length} bytes but only {capacity} are reserved")]
    MemberRegionOverflow { used_length: u32, capacity: usize },
    #[error("supply for mint {mint} has not been resolved")]
    MissingSupplyData { mint: String },
    #[error("voting power requested against a zero supply")]
    DivisionByZero,
    #[error("expected {expected} member balances, got {actual}")]
    BalanceCountMismatch { expected: usize, actual: usize },
    #[error("requested {expected} accounts, rpc returned {actual}")]
    AccountCountMismatch { expected: usize, actual: usize },
    #[error("creation timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
    #[error("account {prefix}... not found")]
    AccountNotFound { prefix: String },
    #[error("unknown cluster `{0}`")]
    UnknownCluster(String),
    #[error("invalid address `{0}`")]
    InvalidAddress(String),
    #[error("{operation} failed: {source}")]
    Upstream {
        operation: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl SquadsError {
    pub fn upstream(operation: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| Self::Upstream { operation, source }
    }

    /// The layout-level cause, if this is a codec or layout failure.
    pub fn layout_cause(&self) -> Option<&LayoutError> {
        match self {
            Self::Layout(err) => Some(err.root_cause()),
            _ => None,
        }
    }
}
