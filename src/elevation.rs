//! Administrator privileges detection and elevated re-launch.
//!
//! Changing the admin state of an adapter requires elevation. The rest of the
//! crate only asks [`is_elevated`]; how elevation is obtained stays here.
use thiserror::Error;

#[derive(Debug, Error)]
/// Error returned by [`relaunch_elevated`].
pub enum ElevationError {
    /// `ShellExecuteW` refused to start the elevated process.
    #[error("Unable to relaunch as administrator (error code {code}): {reason}")]
    Refused {
        #[allow(missing_docs)]
        code: isize,
        #[allow(missing_docs)]
        reason: &'static str,
    },
    #[allow(missing_docs)]
    #[error("Unable to locate current executable")]
    CurrentExe(#[from] std::io::Error),
    /// Elevated re-launch only exists on Windows.
    #[error("Relaunching as administrator is only supported on Windows")]
    Unsupported,
}

/// Human readable reason for a `ShellExecuteW` return value of 32 or less.
pub fn shell_execute_reason(code: isize) -> &'static str {
    match code {
        0 | 8 => "Out of memory",
        2 => "File not found",
        3 => "Path not found",
        5 => "Access denied (UAC prompt cancelled or insufficient rights)",
        31 => "No application is associated with the file",
        _ => "Unknown error",
    }
}

/// Return `true` when the current process runs with administrator rights.
#[cfg(target_os = "windows")]
pub fn is_elevated() -> bool {
    // SAFETY: IsUserAnAdmin has no preconditions.
    unsafe { windows::Win32::UI::Shell::IsUserAnAdmin().as_bool() }
}

/// Return `true` when the current process runs with administrator rights.
///
/// Always `false` outside Windows.
#[cfg(not(target_os = "windows"))]
pub fn is_elevated() -> bool {
    false
}

/// Start the current executable again, with the same arguments, through the
/// `runas` verb. On success the caller should exit.
#[cfg(target_os = "windows")]
pub fn relaunch_elevated() -> Result<(), ElevationError> {
    use tracing::{debug, info};
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    let exe = std::env::current_exe()?;
    let params = std::env::args()
        .skip(1)
        .map(|arg| format!("\"{arg}\""))
        .collect::<Vec<_>>()
        .join(" ");
    debug!("Relaunching {:?} {} as administrator", exe, params);
    let exe = HSTRING::from(exe.as_os_str());
    let params = HSTRING::from(params);
    // SAFETY: every string outlives the call.
    let ret = unsafe {
        ShellExecuteW(
            HWND::default(),
            &HSTRING::from("runas"),
            &exe,
            &params,
            PCWSTR::null(),
            SW_SHOWNORMAL,
        )
    };
    let code = ret.0 as isize;
    if code > 32 {
        info!("Elevated instance started");
        Ok(())
    } else {
        Err(ElevationError::Refused {
            code,
            reason: shell_execute_reason(code),
        })
    }
}

/// Elevated re-launch is unavailable on this platform.
#[cfg(not(target_os = "windows"))]
pub fn relaunch_elevated() -> Result<(), ElevationError> {
    Err(ElevationError::Unsupported)
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn map_shell_execute_codes() {
        assert_eq!(shell_execute_reason(0), "Out of memory");
        assert_eq!(shell_execute_reason(8), "Out of memory");
        assert_eq!(shell_execute_reason(2), "File not found");
        assert_eq!(shell_execute_reason(3), "Path not found");
        assert!(shell_execute_reason(5).starts_with("Access denied"));
        assert_eq!(
            shell_execute_reason(31),
            "No application is associated with the file"
        );
        assert_eq!(shell_execute_reason(26), "Unknown error");
    }

    #[test]
    fn format_refusal() {
        let err = ElevationError::Refused {
            code: 5,
            reason: shell_execute_reason(5),
        };
        assert!(err.to_string().starts_with("Unable to relaunch as administrator (error code 5)"));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn be_unsupported_outside_windows() {
        assert!(!is_elevated());
        assert!(matches!(relaunch_elevated(), Err(ElevationError::Unsupported)));
    }
}
