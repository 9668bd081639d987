//! Build information printed by `--version`

use std::io::{self, Write};

/// Value used for build metadata that was not provided at compile time
const UNKNOWN: &str = "?";

/// Version details of this build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub date: &'static str,
    pub rustc: &'static str,
}

impl VersionInfo {
    /// Version info baked in at compile time. Release builds set
    /// `KUOTA_CALC_COMMIT`, `KUOTA_CALC_BUILD_DATE` and `KUOTA_CALC_RUSTC`.
    pub fn from_build() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("KUOTA_CALC_COMMIT").unwrap_or(UNKNOWN),
            date: option_env!("KUOTA_CALC_BUILD_DATE").unwrap_or(UNKNOWN),
            rustc: option_env!("KUOTA_CALC_RUSTC").unwrap_or(UNKNOWN),
        }
    }

    pub fn write_to<W: Write>(&self, binary: &str, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{}, version {} (revision: {})\n\tbuild date: {}\n\trust version: {}",
            binary, self.version, self.commit, self.date, self.rustc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_version() {
        let info = VersionInfo {
            version: "1.2.3",
            commit: "abc123",
            date: "2024-01-01",
            rustc: "1.75.0",
        };

        let mut out = Vec::new();
        info.write_to("kuota-calc", &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "kuota-calc, version 1.2.3 (revision: abc123)\n\tbuild date: 2024-01-01\n\trust version: 1.75.0\n"
        );
    }

    #[test]
    fn test_from_build_uses_package_version() {
        assert_eq!(VersionInfo::from_build().version, env!("CARGO_PKG_VERSION"));
    }
}
