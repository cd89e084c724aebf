//! Spawns the `integrity` binary under a low-integrity token and checks what
//! it reports about itself. The spawn side lives here, in the harness, so the
//! library stays a pure token binding.

#![cfg(windows)]

use core::{
    mem::{size_of, zeroed},
    ptr::{null, null_mut},
};
use std::{ffi::OsStr, os::windows::ffi::OsStrExt};

use anyhow::{bail, Result};
use integrity_rs::{IntegrityLevel, Token};
use windows_sys::Win32::{
    Foundation::{CloseHandle, GetLastError, FALSE, TRUE},
    Security::SECURITY_ATTRIBUTES,
    Storage::FileSystem::ReadFile,
    System::Pipes::CreatePipe,
    System::Threading::{
        CreateProcessAsUserW, GetExitCodeProcess, WaitForSingleObject, CREATE_NO_WINDOW,
        INFINITE, PROCESS_INFORMATION, STARTF_USESTDHANDLES, STARTUPINFOW,
    },
};

fn to_pwstr(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

/// Runs the helper binary with `token` as its primary token, capturing its
/// combined stdout/stderr over an anonymous pipe.
fn spawn_with_token(token: &Token, args: &str) -> Result<(String, u32)> {
    unsafe {
        let sa = SECURITY_ATTRIBUTES {
            nLength: size_of::<SECURITY_ATTRIBUTES>() as u32,
            lpSecurityDescriptor: null_mut(),
            bInheritHandle: TRUE,
        };

        let mut read = null_mut();
        let mut write = null_mut();
        if CreatePipe(&mut read, &mut write, &sa, 0) == FALSE {
            bail!("CreatePipe Failed With Error: {}", GetLastError());
        }

        let mut si = zeroed::<STARTUPINFOW>();
        si.cb = size_of::<STARTUPINFOW>() as u32;
        si.dwFlags = STARTF_USESTDHANDLES;
        si.hStdOutput = write;
        si.hStdError = write;
        let mut pi = zeroed::<PROCESS_INFORMATION>();

        // Quote the exe path so a target directory with spaces still parses.
        let command = if args.is_empty() {
            format!("\"{}\"", env!("CARGO_BIN_EXE_integrity"))
        } else {
            format!("\"{}\" {}", env!("CARGO_BIN_EXE_integrity"), args)
        };
        let mut command = to_pwstr(&command);

        if CreateProcessAsUserW(
            token.as_raw_handle(),
            null(),
            command.as_mut_ptr(),
            null(),
            null(),
            TRUE,
            CREATE_NO_WINDOW,
            null(),
            null(),
            &si,
            &mut pi,
        ) == FALSE
        {
            let code = GetLastError();
            CloseHandle(read);
            CloseHandle(write);
            bail!("CreateProcessAsUserW Failed With Error: {}", code);
        }

        // Drop our copy of the write end so ReadFile sees EOF once the
        // child's inherited copy closes with it.
        CloseHandle(write);

        let mut output = String::new();
        let mut buffer = [0u8; 1 << 12];
        let mut bytes_read = 0;
        while ReadFile(
            read,
            buffer.as_mut_ptr(),
            buffer.len() as u32,
            &mut bytes_read,
            null_mut(),
        ) != FALSE
            && bytes_read != 0
        {
            output.push_str(&String::from_utf8_lossy(&buffer[..bytes_read as usize]));
        }
        CloseHandle(read);

        WaitForSingleObject(pi.hProcess, INFINITE);
        let mut code = 0;
        if GetExitCodeProcess(pi.hProcess, &mut code) == FALSE {
            let err = GetLastError();
            CloseHandle(pi.hThread);
            CloseHandle(pi.hProcess);
            bail!("GetExitCodeProcess Failed With Error: {}", err);
        }
        CloseHandle(pi.hThread);
        CloseHandle(pi.hProcess);

        Ok((output, code))
    }
}

#[test]
fn child_runs_at_low_integrity() -> Result<()> {
    let token = Token::for_level(IntegrityLevel::Low)?;

    let (output, code) = spawn_with_token(&token, "")?;
    assert_eq!(code, 0, "helper exited with {code}: {output}");
    assert_eq!(output.trim(), "low");

    Ok(())
}

#[test]
fn child_reports_low_label_sid() -> Result<()> {
    let token = Token::for_level(IntegrityLevel::Low)?;

    let (output, code) = spawn_with_token(&token, "--sid")?;
    assert_eq!(code, 0, "helper exited with {code}: {output}");
    assert_eq!(output.trim(), IntegrityLevel::Low.sid_string());

    Ok(())
}

#[test]
fn malformed_sid_fails_before_any_spawn() {
    let err = Token::with_integrity_level("not-a-sid").unwrap_err();
    assert!(matches!(err, integrity_rs::Error::MalformedSid(..)));
}
