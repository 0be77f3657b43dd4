//! Interface names bounded to the kernel's fixed-size name field
//!
//! Every name handed to the kernel travels in a 16-byte, NUL-terminated
//! buffer. `IfName` guarantees the fit up front so the buffer copy can never
//! fail or silently clip.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Size of the kernel name field, terminator included
pub const IFNAMSIZ: usize = libc::IFNAMSIZ;

/// Longest usable name
pub const MAX_NAME_LEN: usize = IFNAMSIZ - 1;

/// What to do with names that do not fit the kernel name field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamePolicy {
    /// Cut to 15 bytes and log a warning
    #[default]
    Truncate,
    /// Refuse with `Error::InvalidName`
    Reject,
}

/// A non-empty interface name of at most 15 bytes without interior NUL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfName(String);

impl IfName {
    /// Validate a name, rejecting anything longer than 15 bytes
    pub fn new(name: &str) -> Result<Self> {
        Self::with_policy(name, NamePolicy::Reject)
    }

    /// Validate a name, truncating anything longer than 15 bytes
    pub fn truncated(name: &str) -> Result<Self> {
        Self::with_policy(name, NamePolicy::Truncate)
    }

    /// Validate a name under the given policy
    pub fn with_policy(name: &str, policy: NamePolicy) -> Result<Self> {
        if name.is_empty() {
            return Err(invalid(name, "name is empty"));
        }
        if name.contains('\0') {
            return Err(invalid(name, "name contains a NUL byte"));
        }
        if name.len() <= MAX_NAME_LEN {
            return Ok(Self(name.to_string()));
        }

        match policy {
            NamePolicy::Reject => Err(invalid(
                name,
                &format!("name too long (max {} chars)", MAX_NAME_LEN),
            )),
            NamePolicy::Truncate => {
                // Cut on a char boundary so the result stays valid UTF-8
                let mut end = MAX_NAME_LEN;
                while !name.is_char_boundary(end) {
                    end -= 1;
                }
                let short = &name[..end];
                warn!(requested = name, truncated = short, "interface name truncated to fit IFNAMSIZ");
                Ok(Self(short.to_string()))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Zero-filled kernel name field holding this name and its terminator
    pub fn to_c_buf(&self) -> [libc::c_char; IFNAMSIZ] {
        let mut buf = [0 as libc::c_char; IFNAMSIZ];
        for (dst, &src) in buf.iter_mut().zip(self.0.as_bytes()) {
            *dst = src as libc::c_char;
        }
        buf
    }

    /// Decode a kernel-filled name field up to its terminator
    ///
    /// Returns `None` for an empty field or one that is not valid UTF-8.
    pub fn from_c_buf(buf: &[libc::c_char]) -> Option<String> {
        let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        let bytes: Vec<u8> = buf[..len].iter().map(|&c| c as u8).collect();
        String::from_utf8(bytes).ok().filter(|s| !s.is_empty())
    }
}

fn invalid(name: &str, reason: &str) -> Error {
    Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IfName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for IfName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
