// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Platform detection: the `<os>_<arch>` tag that gates commands and the
//! list separator used for `PATH`-style variables.

use std::fmt;

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

impl Os {
    #[cfg(target_os = "linux")]
    pub const fn current() -> Self {
        Os::Linux
    }

    #[cfg(target_os = "macos")]
    pub const fn current() -> Self {
        Os::Darwin
    }

    #[cfg(target_os = "windows")]
    pub const fn current() -> Self {
        Os::Windows
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    Arm64,
    X86,
    Arm,
}

impl Arch {
    #[cfg(target_arch = "x86_64")]
    pub const fn current() -> Self {
        Arch::Amd64
    }

    #[cfg(target_arch = "aarch64")]
    pub const fn current() -> Self {
        Arch::Arm64
    }

    #[cfg(target_arch = "x86")]
    pub const fn current() -> Self {
        Arch::X86
    }

    #[cfg(target_arch = "arm")]
    pub const fn current() -> Self {
        Arch::Arm
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::X86 => "386",
            Arch::Arm => "arm",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Separator between elements of a `PATH`-style variable.
pub const LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// The runtime platform tag, e.g. `linux_amd64` or `darwin_arm64`.
pub fn tag() -> String {
    format!("{}_{}", Os::current(), Arch::current())
}

/// Whether environment variable names compare case-insensitively by default.
pub const fn default_case_insensitive_environment() -> bool {
    cfg!(windows)
}

/// Whether the filesystem distinguishes path casing by default.
pub const fn default_case_sensitive_filesystem() -> bool {
    !cfg!(any(windows, target_os = "macos"))
}
