//! Pre-flight checks for probe-reader
//!
//! Validates system requirements before attempting to load eBPF programs.
//! Provides clear, actionable error messages when requirements aren't met.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Minimum kernel version for per-CPU arrays read from tracepoint and kprobe
/// programs
const MIN_KERNEL_VERSION: (u32, u32) = (4, 18);

/// Run all pre-flight checks before eBPF loading
pub fn run_preflight_checks(object_path: &Path) -> Result<()> {
    check_privileges()?;
    check_kernel_version()?;
    check_object_exists(object_path)?;
    Ok(())
}

/// Check if running with sufficient privileges for eBPF
fn check_privileges() -> Result<()> {
    if unsafe { libc::geteuid() } == 0 {
        return Ok(());
    }

    bail!(
        "Permission denied: probe-reader requires root privileges to load eBPF programs.\n\n\
         Run with: sudo probe-reader ..."
    );
}

/// Check if the kernel version is sufficient for eBPF features
fn check_kernel_version() -> Result<()> {
    let version_str = std::fs::read_to_string("/proc/version")
        .context("Failed to read kernel version from /proc/version")?;

    // "Linux version 5.15.0-generic ..."
    let release = version_str.split_whitespace().nth(2).unwrap_or("unknown");

    let Some((major, minor)) = parse_kernel_release(release) else {
        // Can't parse, assume it's fine
        return Ok(());
    };

    if (major, minor) < MIN_KERNEL_VERSION {
        bail!(
            "Kernel version {}.{} is too old.\n\n\
             probe-reader requires Linux {}.{} or newer.\n\
             Current kernel: {}",
            major,
            minor,
            MIN_KERNEL_VERSION.0,
            MIN_KERNEL_VERSION.1,
            release
        );
    }

    Ok(())
}

/// Major and minor version of a kernel release string like "6.1.0-arch1-1"
fn parse_kernel_release(release: &str) -> Option<(u32, u32)> {
    let mut parts = release.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts
        .next()?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;
    Some((major, minor))
}

/// Check if the eBPF object exists and is a file
fn check_object_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!(
            "eBPF object not found: {}\n\n\
             Make sure the path is correct and the object was built.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!(
            "Not a file: {}\n\n\
             --object must point to a compiled eBPF object, not a directory.",
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_version_check() {
        // Don't assert success since test might run on old kernel
        let _ = check_kernel_version();
    }

    #[test]
    fn test_parse_kernel_release() {
        assert_eq!(parse_kernel_release("5.15.0-generic"), Some((5, 15)));
        assert_eq!(parse_kernel_release("6.1rc3"), Some((6, 1)));
        assert_eq!(parse_kernel_release("unknown"), None);
    }

    #[test]
    fn test_object_not_found() {
        let result = check_object_exists(Path::new("/nonexistent/path/to/probe.o"));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("eBPF object not found"));
    }

    #[test]
    fn test_object_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_object_exists(dir.path()).unwrap_err().to_string();
        assert!(err.contains("Not a file"));
    }
}
