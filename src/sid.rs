use core::ptr::null_mut;
use std::{ffi::OsStr, os::windows::ffi::OsStrExt};

use windows_sys::Win32::{
    Foundation::{GetLastError, LocalFree, FALSE, PSID},
    Security::{
        Authorization::{ConvertSidToStringSidW, ConvertStringSidToSidW},
        GetLengthSid,
    },
};

use crate::error::Error;

/// An owned security identifier converted from its string form.
///
/// The backing allocation comes from `ConvertStringSidToSidW` and is released
/// with `LocalFree` when the value drops.
pub struct Sid {
    psid: PSID,
}

impl Sid {
    /// Converts a SID string into an owned SID.
    ///
    /// # Parameters
    ///
    /// * `sid` - The SID in string form (e.g. `S-1-16-4096`).
    ///
    /// # Returns
    ///
    /// * `Ok(Sid)` - The converted SID.
    /// * `Err(Error::MalformedSid)` - If the string is not a well-formed SID.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let sid = Sid::from_string("S-1-16-4096")?;
    /// assert_eq!(sid.to_string_sid()?, "S-1-16-4096");
    /// ```
    pub fn from_string(sid: &str) -> Result<Self, Error> {
        let wide = sid.to_pwstr();
        let mut psid: PSID = null_mut();
        if unsafe { ConvertStringSidToSidW(wide.as_ptr(), &mut psid) } == FALSE {
            return Err(Error::MalformedSid(sid.to_string(), unsafe {
                GetLastError()
            }));
        }

        Ok(Self { psid })
    }

    /// Raw `PSID` view for passing to Windows APIs; valid while `self` lives.
    pub fn as_psid(&self) -> PSID {
        self.psid
    }

    /// Byte length of the SID structure, per `GetLengthSid`.
    pub fn byte_len(&self) -> u32 {
        unsafe { GetLengthSid(self.psid) }
    }

    /// Renders this SID back to its canonical string form.
    pub fn to_string_sid(&self) -> Result<String, Error> {
        sid_to_string(self.psid)
    }
}

impl Drop for Sid {
    fn drop(&mut self) {
        unsafe { LocalFree(self.psid) };
    }
}

/// Renders a SID to its canonical `S-1-...` string form.
///
/// The SID is borrowed for the duration of the call; the string buffer the
/// OS allocates is released before returning.
///
/// # Parameters
///
/// * `sid` - The SID to render. Must point at a valid SID structure.
///
/// # Returns
///
/// * `Ok(String)` - The canonical string form.
/// * `Err(Error::SidToString)` - If the conversion fails.
pub fn sid_to_string(sid: PSID) -> Result<String, Error> {
    let mut raw: *mut u16 = null_mut();
    if unsafe { ConvertSidToStringSidW(sid, &mut raw) } == FALSE {
        return Err(Error::SidToString(unsafe { GetLastError() }));
    }

    let mut len = 0;
    while unsafe { *raw.add(len) } != 0 {
        len += 1;
    }

    let text = String::from_utf16_lossy(unsafe { core::slice::from_raw_parts(raw, len) });
    unsafe { LocalFree(raw.cast()) };

    Ok(text)
}

trait PWSTR {
    /// Converts a `&str` to a null-terminated UTF-16 wide string.
    fn to_pwstr(&self) -> Vec<u16>;
}

impl PWSTR for &str {
    fn to_pwstr(&self) -> Vec<u16> {
        OsStr::new(self).encode_wide().chain(std::iter::once(0)).collect()
    }
}
