/// Failure modes for integrity-level token operations.
///
/// Each variant maps to a single Windows API call or lookup step, so callers
/// can tell bad input apart from privilege denials and OS-level failures.
/// None of these are retryable: every one is either a caller error or a
/// privilege condition that will not change within a call.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `OpenProcessToken` refused to open the current process token.
    #[error("OpenProcessToken Failed With Error: {0}")]
    OpenToken(u32),

    /// The size probe succeeded instead of reporting the required buffer
    /// size, violating the two-phase query convention.
    #[error("GetTokenInformation(TokenIntegrityLevel): buffer size not returned")]
    BufferSizeNotReturned,

    /// `GetTokenInformation` failed outside the expected insufficient-buffer
    /// probe response.
    #[error("GetTokenInformation Failed With Error: {0}")]
    QueryToken(u32),

    /// The OS returned a mandatory-label record shorter than its fixed
    /// header, so the embedded SID cannot be read safely.
    #[error("TOKEN_MANDATORY_LABEL truncated: {0} bytes returned")]
    TruncatedLabel(usize),

    /// `DuplicateTokenEx` could not produce a new primary token.
    #[error("DuplicateTokenEx Failed With Error: {0}")]
    DuplicateToken(u32),

    /// `SetTokenInformation` rejected the new mandatory label.
    #[error("SetTokenInformation Failed With Error: {0}")]
    SetToken(u32),

    /// The caller-supplied string is not a well-formed SID.
    #[error("ConvertStringSidToSidW Failed With Error: {1}. SID: {0}")]
    MalformedSid(String, u32),

    /// `ConvertSidToStringSidW` could not render a SID to text.
    #[error("ConvertSidToStringSidW Failed With Error: {0}")]
    SidToString(u32),

    /// A well-formed SID that is not one of the eight mandatory-level SIDs.
    #[error("Unknown integrity level. SID: {0}")]
    UnknownIntegrityLevel(String),
}
