use kiln_platform::PlatformTag;

pub const DEFAULT_HOST: &str = "https://mcef-download.cinemamod.com";
pub const DEFAULT_PREFIX: &str = "java-cef-builds";

/// Where a given engine version lives on the mirror.
///
/// Archives are served at `{host}/{prefix}/{version}/{platform}.tar.gz`, with
/// the checksum next to them under a `.sha256` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
    host: String,
    prefix: String,
    version: String,
}

impl RemoteLayout {
    pub fn new(host: impl Into<String>, prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            prefix: prefix.into(),
            version: version.into(),
        }
    }

    /// The default mirror and prefix for `version`.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PREFIX, version)
    }

    pub fn archive_url(&self, platform: &PlatformTag) -> String {
        let host = self.host.trim_end_matches('/');
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{host}/{}/{}.tar.gz", self.version, platform.name())
        } else {
            format!("{host}/{prefix}/{}/{}.tar.gz", self.version, platform.name())
        }
    }

    pub fn checksum_url(&self, platform: &PlatformTag) -> String {
        format!("{}.sha256", self.archive_url(platform))
    }
}
