use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Error;

/// Name of the optional project config file.
pub const CONFIG_FILE: &str = ".qmlref.toml";

/// Archive prefix that marks a path as living inside the Qt resource system.
const DEFAULT_ARCHIVE_PREFIX: &str = "qrc:/";

/// Build-output directory that `qrc:/` paths are rooted at.
const DEFAULT_ARCHIVE_ROOT: &str = "qml";

/// Build-output subpath mirroring the source tree for the gauges module.
const DEFAULT_BUILD_SUBPATH: &str = "qml/DevDash/Gauges";

/// Binary asset extensions that must be addressed through the archive.
const DEFAULT_ASSET_EXTENSIONS: &[&str] =
    &["dds", "exr", "glb", "gltf", "hdr", "jpg", "ktx", "mesh", "obj", "png"];

/// Sibling module markers, checked in order.
const DEFAULT_MODULES: &[(&str, &str)] = &[
    ("Primitives", "DevDash.Gauges.Primitives"),
    ("Compounds", "DevDash.Gauges.Compounds"),
];

/// A path segment naming a separately packaged QML module.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ModuleMarker {
    /// Text searched for in the raw Loader target.
    pub marker: String,
    /// Dotted QML module URI reported in the diagnostic.
    pub name: String,
}

/// Project configuration loaded from `.qmlref.toml`.
/// Fixed once loaded; every scan in the process reads the same values.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix an asset path must start with.
    pub archive_prefix: String,
    /// Directory under the build root that archive-addressed paths map onto.
    pub archive_root: String,
    /// Lowercased asset extensions without the leading dot.
    pub asset_extensions: BTreeSet<String>,
    /// Subpath under the build root that mirrors the source tree.
    pub build_subpath: String,
    /// Relative path prefixes to skip.
    exclude: Vec<String>,
    /// Relative path prefixes to scan; empty scans everything.
    include: Vec<String>,
    /// Ordered sibling module markers.
    pub modules: Vec<ModuleMarker>,
}

/// Raw TOML structure for `.qmlref.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct QmlrefTomlConfig {
    /// Overrides the archive prefix.
    archive_prefix: Option<String>,
    /// Overrides the archive root.
    archive_root: Option<String>,
    /// Replaces the default asset extension set.
    asset_extensions: Option<Vec<String>>,
    /// Overrides the build subpath.
    build_subpath: Option<String>,
    /// Relative path prefixes to skip.
    #[serde(default)]
    exclude: Vec<String>,
    /// Relative path prefixes to scan.
    #[serde(default)]
    include: Vec<String>,
    /// Replaces the default module marker list.
    modules: Option<Vec<ModuleMarker>>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            archive_root: DEFAULT_ARCHIVE_ROOT.to_string(),
            asset_extensions: DEFAULT_ASSET_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            build_subpath: DEFAULT_BUILD_SUBPATH.to_string(),
            exclude: Vec::new(),
            include: Vec::new(),
            modules: DEFAULT_MODULES
                .iter()
                .map(|(marker, name)| ModuleMarker {
                    marker: (*marker).to_string(),
                    name: (*name).to_string(),
                })
                .collect(),
        };
    }
}

impl Config {
    /// Load config from `.qmlref.toml` in the given project root.
    /// Returns the defaults if the file doesn't exist, and an error if it
    /// exists but is malformed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        return Self::parse(&content).map_err(|source| Error::TomlDe { path, source });
    }

    /// Parse config TOML, layering present keys over the defaults.
    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let raw: QmlrefTomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(prefix) = raw.archive_prefix {
            config.archive_prefix = prefix;
        }
        if let Some(archive_root) = raw.archive_root {
            config.archive_root = archive_root;
        }
        if let Some(extensions) = raw.asset_extensions {
            config.asset_extensions = extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect();
        }
        if let Some(subpath) = raw.build_subpath {
            config.build_subpath = subpath;
        }
        if let Some(modules) = raw.modules {
            config.modules = modules;
        }
        config.include = raw.include;
        config.exclude = raw.exclude;

        return Ok(config);
    }

    /// Check whether a QML file path (relative to the source root) should be scanned.
    ///
    /// A path is included if no include patterns are set, or if it starts with
    /// at least one include pattern. An included path is then excluded if it
    /// starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        !self.exclude.iter().any(|p| relative_path.starts_with(p.as_str()))
    }

    /// Check whether a directory (relative to the source root) can hold files
    /// that would be scanned.
    ///
    /// The directory is compared with a trailing `/` (the source root itself is
    /// the empty path). It is kept when it lies under an include pattern or an
    /// include pattern lies under it, and dropped when it lies under an
    /// exclude pattern.
    pub fn should_descend(&self, relative_dir: &str) -> bool {
        let trimmed = relative_dir.trim_end_matches('/');
        let dir = if trimmed.is_empty() { String::new() } else { format!("{trimmed}/") };
        let included = self.include.is_empty()
            || self
                .include
                .iter()
                .any(|p| dir.starts_with(p.as_str()) || p.starts_with(dir.as_str()));

        if !included {
            return false;
        }

        !self.exclude.iter().any(|p| dir.starts_with(p.as_str()))
    }
}
