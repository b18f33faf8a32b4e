// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::ffi::OsString;
use std::path::PathBuf;

/// File name of the configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Return the application data directory.  It is not created here.
pub fn data_dir() -> PathBuf {
    base_dir(std::env::var_os("XDG_DATA_HOME"), std::env::var_os("HOME")).join("spoolward")
}

/// Where the configuration is looked up when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}

fn base_dir(xdg: Option<OsString>, home: Option<OsString>) -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Some(xdg) = xdg.filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = home.filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins() {
        let dir = base_dir(Some("/xdg".into()), Some("/home/kiosk".into()));
        assert_eq!(dir, PathBuf::from("/xdg"));
    }

    #[test]
    fn home_fallback() {
        let dir = base_dir(Some("".into()), Some("/home/kiosk".into()));
        assert_eq!(dir, PathBuf::from("/home/kiosk/.local/share"));
    }

    #[test]
    fn temp_dir_last() {
        assert_eq!(base_dir(None, None), std::env::temp_dir());
    }
}
