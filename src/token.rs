use core::{
    ffi::c_void,
    mem::size_of,
    ptr::{null, null_mut},
};

use tracing::trace;
use windows_sys::Win32::{
    Foundation::{CloseHandle, GetLastError, ERROR_INSUFFICIENT_BUFFER, FALSE, HANDLE},
    Security::{
        DuplicateTokenEx, GetTokenInformation, SecurityImpersonation, SetTokenInformation,
        TokenIntegrityLevel, TokenPrimary, SE_GROUP_INTEGRITY, SID_AND_ATTRIBUTES,
        TOKEN_ACCESS_MASK, TOKEN_ADJUST_DEFAULT, TOKEN_ASSIGN_PRIMARY, TOKEN_DUPLICATE,
        TOKEN_INFORMATION_CLASS, TOKEN_MANDATORY_LABEL, TOKEN_QUERY,
    },
    System::Threading::{GetCurrentProcess, OpenProcessToken},
};

use crate::{
    error::Error,
    level::IntegrityLevel,
    sid::{sid_to_string, Sid},
};

/// An owned access-token handle, closed exactly once when dropped.
///
/// Obtained either by opening the current process token or by building a
/// duplicate stamped with a chosen integrity level. Ownership of the raw
/// handle can be surrendered with [`Token::into_raw_handle`] when a
/// process-creation API takes over its lifetime.
#[derive(Debug)]
pub struct Token {
    handle: HANDLE,
}

impl Token {
    /// Opens the current process's token with the requested access rights.
    ///
    /// # Parameters
    ///
    /// * `access` - The desired access mask (e.g. `TOKEN_QUERY`).
    ///
    /// # Returns
    ///
    /// * `Ok(Token)` - The opened token; closed when dropped.
    /// * `Err(Error::OpenToken)` - If the OS denies the open.
    pub fn open_current(access: TOKEN_ACCESS_MASK) -> Result<Self, Error> {
        let mut handle = null_mut();
        if unsafe { OpenProcessToken(GetCurrentProcess(), access, &mut handle) } == FALSE {
            return Err(Error::OpenToken(unsafe { GetLastError() }));
        }

        Ok(Self { handle })
    }

    /// Reports the integrity level carried by this token's mandatory label.
    ///
    /// # Returns
    ///
    /// * `Ok(IntegrityLevel)` - The resolved level.
    /// * `Err(Error)` - If the query fails, the returned record is shorter
    ///   than the `TOKEN_MANDATORY_LABEL` header, or the label SID is not one
    ///   of the eight known mandatory-level SIDs.
    pub fn integrity_level(&self) -> Result<IntegrityLevel, Error> {
        let buffer = query_variable_info(self.handle, TokenIntegrityLevel)?;
        if buffer.len() < size_of::<TOKEN_MANDATORY_LABEL>() {
            return Err(Error::TruncatedLabel(buffer.len()));
        }

        // The label SID lives inside `buffer`; it is read in place and never
        // outlives this scope.
        let label = unsafe { &*(buffer.as_ptr() as *const TOKEN_MANDATORY_LABEL) };
        let sid = sid_to_string(label.Label.Sid)?;

        IntegrityLevel::from_sid_string(&sid)
    }

    /// Builds a new primary token carrying the given integrity-level SID.
    ///
    /// The current process token is duplicated and the duplicate's mandatory
    /// label is rewritten, leaving the source token untouched. Lowering the
    /// level never needs extra privileges; raising it above the caller's own
    /// level fails unless the caller holds `SeTcbPrivilege`.
    ///
    /// # Parameters
    ///
    /// * `sid` - The integrity-level SID in string form (e.g. `S-1-16-4096`
    ///   for low). Rejected before any token handle is opened if malformed.
    ///
    /// # Returns
    ///
    /// * `Ok(Token)` - A fresh primary token owned by the caller, suitable
    ///   for `CreateProcessAsUserW`.
    /// * `Err(Error::MalformedSid)` - If `sid` does not parse.
    /// * `Err(Error::OpenToken)` - If the process token cannot be opened.
    /// * `Err(Error::DuplicateToken)` - If duplication fails.
    /// * `Err(Error::SetToken)` - If the label cannot be applied; the
    ///   duplicate is closed before the error propagates.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let token = Token::with_integrity_level("S-1-16-4096")?;
    /// assert_eq!(token.integrity_level()?, IntegrityLevel::Low);
    /// ```
    pub fn with_integrity_level(sid: &str) -> Result<Self, Error> {
        // Malformed input is rejected before any handle exists.
        let sid = Sid::from_string(sid)?;

        let source = Token::open_current(
            TOKEN_DUPLICATE | TOKEN_ADJUST_DEFAULT | TOKEN_QUERY | TOKEN_ASSIGN_PRIMARY,
        )?;

        // Desired access 0 inherits the access of the source token.
        let mut duplicate = null_mut();
        if unsafe {
            DuplicateTokenEx(
                source.handle,
                0,
                null(),
                SecurityImpersonation,
                TokenPrimary,
                &mut duplicate,
            )
        } == FALSE
        {
            return Err(Error::DuplicateToken(unsafe { GetLastError() }));
        }
        let token = Token { handle: duplicate };
        trace!("duplicated current process token into a primary token");

        let label = TOKEN_MANDATORY_LABEL {
            Label: SID_AND_ATTRIBUTES {
                Sid: sid.as_psid(),
                Attributes: SE_GROUP_INTEGRITY,
            },
        };

        // The record's byte length includes the variable-length SID it
        // points at, not just the fixed header.
        let length = size_of::<TOKEN_MANDATORY_LABEL>() as u32 + sid.byte_len();
        if unsafe {
            SetTokenInformation(
                token.handle,
                TokenIntegrityLevel,
                &label as *const TOKEN_MANDATORY_LABEL as *const c_void,
                length,
            )
        } == FALSE
        {
            return Err(Error::SetToken(unsafe { GetLastError() }));
        }

        Ok(token)
    }

    /// Builds a new primary token stamped with `level`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let token = Token::for_level(IntegrityLevel::Low)?;
    /// ```
    pub fn for_level(level: IntegrityLevel) -> Result<Self, Error> {
        Self::with_integrity_level(level.sid_string())
    }

    /// Raw handle view; the token still owns it and closes it on drop.
    pub fn as_raw_handle(&self) -> HANDLE {
        self.handle
    }

    /// Surrenders ownership of the raw handle; the caller must close it.
    pub fn into_raw_handle(self) -> HANDLE {
        let handle = self.handle;
        core::mem::forget(self);
        handle
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

/// Reports the calling process's own integrity level.
///
/// Opens the process token for query access, reads its mandatory label and
/// resolves the embedded SID to a named level. The token handle is released
/// on every path.
///
/// # Returns
///
/// * `Ok(IntegrityLevel)` - One of the eight named levels.
/// * `Err(Error)` - If any step fails; see [`Token::integrity_level`].
///
/// # Example
///
/// ```rust,ignore
/// println!("{}", current_process_integrity_level()?);
/// ```
pub fn current_process_integrity_level() -> Result<IntegrityLevel, Error> {
    let token = Token::open_current(TOKEN_QUERY)?;
    token.integrity_level()
}

/// Queries variable-sized token information with the two-phase size probe.
///
/// The probe call is expected to fail with `ERROR_INSUFFICIENT_BUFFER` and
/// report the needed size; a probe that succeeds violates the query
/// convention and is treated as a hard inconsistency rather than trusted.
/// Any other probe error propagates verbatim.
fn query_variable_info(
    token: HANDLE,
    class: TOKEN_INFORMATION_CLASS,
) -> Result<Vec<u8>, Error> {
    let mut needed = 0u32;
    if unsafe { GetTokenInformation(token, class, null_mut(), 0, &mut needed) } != FALSE {
        return Err(Error::BufferSizeNotReturned);
    }

    let probe = unsafe { GetLastError() };
    if probe != ERROR_INSUFFICIENT_BUFFER {
        return Err(Error::QueryToken(probe));
    }

    let mut buffer = vec![0u8; needed as usize];
    if unsafe {
        GetTokenInformation(
            token,
            class,
            buffer.as_mut_ptr().cast(),
            needed,
            &mut needed,
        )
    } == FALSE
    {
        return Err(Error::QueryToken(unsafe { GetLastError() }));
    }
    trace!(class, needed, "filled token information buffer");

    Ok(buffer)
}
