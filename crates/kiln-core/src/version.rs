//! Version parsing and detection for the external toolchain.
//!
//! Detection failures are never errors: a tool that does not answer `--version` with an
//! `X.Y.Z` somewhere in its output simply yields `None`, and callers turn that into a
//! warning.

use std::fmt;
use std::str::FromStr;

use tokio::process::Command;

/// A `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Compiler version pinned in every generated `aiken.toml`.
pub const PINNED_COMPILER: Version = Version::new(1, 1, 21);

/// Standard library version pinned in every generated `aiken.toml`.
pub const PINNED_STDLIB: Version = Version::new(3, 0, 0);

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Find the first `X.Y.Z` in `s`.
    ///
    /// Accepts the shapes the toolchain prints, e.g. `aiken v1.1.21+42babe5` or
    /// `aikido 0.3.2`. Build metadata and pre-release suffixes are ignored.
    pub fn parse(s: &str) -> Option<Self> {
        s.char_indices()
            .filter(|&(i, c)| {
                c.is_ascii_digit() && (i == 0 || !s.as_bytes()[i - 1].is_ascii_digit())
            })
            .find_map(|(i, _)| Self::parse_at(&s[i..]))
    }

    fn parse_at(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch: String = parts
            .next()?
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        Some(Self::new(major, minor, patch.parse().ok()?))
    }
}

impl FromStr for Version {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Run `<tool> --version` and parse stdout, falling back to stderr.
pub async fn detect_version(tool: &str) -> Option<Version> {
    let output = Command::new(tool)
        .arg("--version")
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if output.status.success() {
        Version::parse(&stdout).or_else(|| Version::parse(&stderr))
    } else {
        Version::parse(&stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aiken_format() {
        assert_eq!(
            Version::parse("aiken v1.1.21+42babe5"),
            Some(Version::new(1, 1, 21))
        );
    }

    #[test]
    fn test_parse_plain_and_prerelease() {
        assert_eq!(Version::parse("0.3.2"), Some(Version::new(0, 3, 2)));
        assert_eq!(Version::parse("aikido 2.0.0-beta1"), Some(Version::new(2, 0, 0)));
    }

    #[test]
    fn test_parse_skips_partial_numbers() {
        // "v2" alone is not a version; the scan continues to the real one.
        assert_eq!(
            Version::parse("plutus v2, compiler 1.0.29"),
            Some(Version::new(1, 0, 29))
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Version::parse("no version here").is_none());
        assert!(Version::parse("").is_none());
        assert!(Version::parse("1.2").is_none());
    }

    #[test]
    fn test_ordering_against_pin() {
        assert!(Version::new(1, 0, 29) < PINNED_COMPILER);
        assert!(Version::new(1, 1, 22) > PINNED_COMPILER);
        assert!(Version::new(2, 0, 0) > PINNED_COMPILER);
    }

    #[test]
    fn test_display() {
        assert_eq!(PINNED_COMPILER.to_string(), "1.1.21");
    }

    #[tokio::test]
    async fn test_detect_version_nonexistent_tool() {
        assert!(detect_version("this_tool_does_not_exist_xyz").await.is_none());
    }
}
