//! Per-platform archives.
//!
//! An archive is one compiled framework for one platform, produced by the
//! platform archiver (`xcodebuild archive`). xcfuse only decides what to
//! archive and where; how an archive is compiled is up to the archiver.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::process::{require_executable, ProcessBuilder};

/// A platform a framework can be archived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Ios,
    IosSimulator,
    Macos,
    #[serde(rename = "maccatalyst")]
    MacCatalyst,
    Tvos,
    TvosSimulator,
    Watchos,
    WatchosSimulator,
    Visionos,
    VisionosSimulator,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Platform::Ios,
        Platform::IosSimulator,
        Platform::Macos,
        Platform::MacCatalyst,
        Platform::Tvos,
        Platform::TvosSimulator,
        Platform::Watchos,
        Platform::WatchosSimulator,
        Platform::Visionos,
        Platform::VisionosSimulator,
    ];

    /// Platforms used when none are configured.
    pub fn defaults() -> &'static [Platform] {
        &[Platform::Ios, Platform::IosSimulator]
    }

    /// Name used on the command line and in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::IosSimulator => "ios-simulator",
            Platform::Macos => "macos",
            Platform::MacCatalyst => "maccatalyst",
            Platform::Tvos => "tvos",
            Platform::TvosSimulator => "tvos-simulator",
            Platform::Watchos => "watchos",
            Platform::WatchosSimulator => "watchos-simulator",
            Platform::Visionos => "visionos",
            Platform::VisionosSimulator => "visionos-simulator",
        }
    }

    /// Generic `-destination` for `xcodebuild archive`.
    pub fn destination(self) -> &'static str {
        match self {
            Platform::Ios => "generic/platform=iOS",
            Platform::IosSimulator => "generic/platform=iOS Simulator",
            Platform::Macos => "generic/platform=macOS",
            Platform::MacCatalyst => "generic/platform=macOS,variant=Mac Catalyst",
            Platform::Tvos => "generic/platform=tvOS",
            Platform::TvosSimulator => "generic/platform=tvOS Simulator",
            Platform::Watchos => "generic/platform=watchOS",
            Platform::WatchosSimulator => "generic/platform=watchOS Simulator",
            Platform::Visionos => "generic/platform=visionOS",
            Platform::VisionosSimulator => "generic/platform=visionOS Simulator",
        }
    }

    /// Library identifier of this platform's slice inside an XCFramework.
    pub fn library_identifier(self) -> &'static str {
        match self {
            Platform::Ios => "ios-arm64",
            Platform::IosSimulator => "ios-arm64_x86_64-simulator",
            Platform::Macos => "macos-arm64_x86_64",
            Platform::MacCatalyst => "ios-arm64_x86_64-maccatalyst",
            Platform::Tvos => "tvos-arm64",
            Platform::TvosSimulator => "tvos-arm64_x86_64-simulator",
            Platform::Watchos => "watchos-arm64_arm64_32_armv7k",
            Platform::WatchosSimulator => "watchos-arm64_x86_64-simulator",
            Platform::Visionos => "xros-arm64",
            Platform::VisionosSimulator => "xros-arm64_x86_64-simulator",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.name() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown platform `{}` (expected one of: {})",
                    s,
                    Platform::ALL.map(Platform::name).join(", ")
                )
            })
    }
}

/// What to archive.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    /// Package directory containing `Package.swift`
    pub package_dir: PathBuf,

    /// Scheme (the buildable's name)
    pub scheme: String,

    /// Platform to archive for
    pub platform: Platform,

    /// Where the `.xcarchive` goes
    pub archive_path: PathBuf,

    /// Build configuration (Debug, Release)
    pub configuration: String,
}

/// A finished archive: one framework for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    /// XCFramework library identifier of the slice
    pub platform_identifier: String,

    /// Compiled `.framework`
    pub framework_path: PathBuf,

    /// Matching `.dSYM`, when the archiver is expected to produce one
    pub debug_symbols_path: Option<PathBuf>,
}

impl ArchiveDescriptor {
    /// Locate the framework and debug symbols inside an `.xcarchive`.
    pub fn in_archive(archive_path: &Path, framework_name: &str, platform: Platform) -> Self {
        let bundle = format!("{}.framework", framework_name);
        ArchiveDescriptor {
            platform_identifier: platform.library_identifier().to_string(),
            framework_path: archive_path
                .join("Products/Library/Frameworks")
                .join(&bundle),
            debug_symbols_path: Some(archive_path.join("dSYMs").join(format!("{}.dSYM", bundle))),
        }
    }
}

/// Produces one archive per request.
pub trait Archiver: Send + Sync {
    fn archive(&self, request: &ArchiveRequest) -> Result<ArchiveDescriptor>;
}

/// Archiver driving `xcodebuild archive`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcodebuildArchiver;

impl XcodebuildArchiver {
    pub fn new() -> Self {
        XcodebuildArchiver
    }

    fn command(&self, request: &ArchiveRequest) -> Result<ProcessBuilder> {
        let xcodebuild = require_executable("xcodebuild")?;
        Ok(ProcessBuilder::new(xcodebuild)
            .cwd(&request.package_dir)
            .arg("archive")
            .arg("-scheme")
            .arg(&request.scheme)
            .arg("-destination")
            .arg(request.platform.destination())
            .arg("-archivePath")
            .arg(&request.archive_path)
            .arg("-configuration")
            .arg(&request.configuration)
            .args(["SKIP_INSTALL=NO", "BUILD_LIBRARY_FOR_DISTRIBUTION=YES"]))
    }
}

impl Archiver for XcodebuildArchiver {
    fn archive(&self, request: &ArchiveRequest) -> Result<ArchiveDescriptor> {
        tracing::info!("Archiving {} for {}", request.scheme, request.platform);

        self.command(request)?.exec_and_check().with_context(|| {
            format!(
                "failed to archive `{}` for {}",
                request.scheme, request.platform
            )
        })?;

        let descriptor =
            ArchiveDescriptor::in_archive(&request.archive_path, &request.scheme, request.platform);
        if !descriptor.framework_path.is_dir() {
            anyhow::bail!(
                "archive of `{}` for {} has no framework at {}",
                request.scheme,
                request.platform,
                descriptor.framework_path.display()
            );
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform() {
        assert_eq!("ios".parse::<Platform>().unwrap(), Platform::Ios);
        assert_eq!(
            "iOS-Simulator".parse::<Platform>().unwrap(),
            Platform::IosSimulator
        );
        assert_eq!(
            "maccatalyst".parse::<Platform>().unwrap(),
            Platform::MacCatalyst
        );
        let err = "amiga".parse::<Platform>().unwrap_err();
        assert!(err.contains("visionos-simulator"));
    }

    #[test]
    fn test_platform_names_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(platform.name().parse::<Platform>().unwrap(), platform);
            let json = serde_json::to_string(&platform).unwrap();
            assert_eq!(json, format!("\"{}\"", platform.name()));
        }
    }

    #[test]
    fn test_archive_layout() {
        let desc = ArchiveDescriptor::in_archive(
            Path::new("/out/Core-ios.xcarchive"),
            "Core",
            Platform::Ios,
        );
        assert_eq!(desc.platform_identifier, "ios-arm64");
        assert_eq!(
            desc.framework_path,
            PathBuf::from("/out/Core-ios.xcarchive/Products/Library/Frameworks/Core.framework")
        );
        assert_eq!(
            desc.debug_symbols_path,
            Some(PathBuf::from("/out/Core-ios.xcarchive/dSYMs/Core.framework.dSYM"))
        );
    }
}
