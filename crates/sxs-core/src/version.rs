use std::fmt;

use semver::Version;

/// Exact `major.minor.build` identity of a launched editor binary.
///
/// Finer components (revision, hash) are deliberately not part of the key:
/// persisted mappings are keyed by this exact string shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    version: Version,
}

impl VersionKey {
    pub fn new(major: u64, minor: u64, build: u64) -> Self {
        Self {
            version: Version::new(major, minor, build),
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let build = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, build))
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn build(&self) -> u64 {
        self.version.patch
    }

    pub fn family(&self) -> VersionFamily {
        VersionFamily::new(self.major())
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.version.major, self.version.minor, self.version.patch
        )
    }
}

/// Major-version grouping the editor itself partitions its preferences by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionFamily {
    major: u64,
}

impl VersionFamily {
    pub fn new(major: u64) -> Self {
        Self { major }
    }

    pub fn major(self) -> u64 {
        self.major
    }
}

impl fmt::Display for VersionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.x", self.major)
    }
}
