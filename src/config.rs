use crate::error::ConfigError;
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const BUILTIN_REGIONS: &str = include_str!("../configs/regions.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub source_locator: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            run_timeout_secs: default_run_timeout_secs(),
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("timeout_secs"));
        }
        if self.run_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("run_timeout_secs"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    Http(Url),
    File(PathBuf),
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Http(url) => write!(f, "{url}"),
            SourceLocator::File(path) => write!(f, "file://{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub source_locator: SourceLocator,
    pub timezone: Tz,
}

#[derive(Debug, Clone)]
pub struct Registry {
    fetch: FetchConfig,
    regions: Vec<Region>,
}

impl Registry {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_REGIONS, "builtin regions", None)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&text, &path.display().to_string(), Some(base_dir))
    }

    pub fn from_toml_str(
        text: &str,
        origin: &str,
        base_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(text).map_err(|source| ConfigError::Toml {
            origin: origin.to_string(),
            source,
        })?;
        Self::from_config(config, base_dir)
    }

    pub fn from_config(config: RegistryConfig, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        config.fetch.validate()?;
        if config.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }

        let mut seen = HashSet::new();
        let mut regions = Vec::with_capacity(config.regions.len());
        for (index, raw) in config.regions.into_iter().enumerate() {
            let region = raw.into_region(index, base_dir)?;
            if !seen.insert(region.id.clone()) {
                return Err(ConfigError::DuplicateRegion(region.id));
            }
            regions.push(region);
        }

        Ok(Self {
            fetch: config.fetch,
            regions,
        })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn fetch(&self) -> &FetchConfig {
        &self.fetch
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn retain(mut self, id: &str) -> Result<Self, ConfigError> {
        self.regions.retain(|r| r.id == id);
        if self.regions.is_empty() {
            return Err(ConfigError::NoMatchingRegion(id.to_string()));
        }
        Ok(self)
    }
}

impl RegionConfig {
    fn into_region(self, index: usize, base_dir: Option<&Path>) -> Result<Region, ConfigError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(ConfigError::EmptyField { index, field: "id" });
        }
        if self.source_locator.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                index,
                field: "source_locator",
            });
        }

        let timezone = self
            .timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone {
                region: id.clone(),
                timezone: self.timezone.clone(),
            })?;
        let source_locator = parse_locator(&id, self.source_locator.trim(), base_dir)?;
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.clone());

        Ok(Region {
            id,
            name,
            source_locator,
            timezone,
        })
    }
}

fn parse_locator(
    region: &str,
    locator: &str,
    base_dir: Option<&Path>,
) -> Result<SourceLocator, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidLocator {
        region: region.to_string(),
        locator: locator.to_string(),
        reason,
    };

    if let Some(path) = locator.strip_prefix("file://") {
        return Ok(SourceLocator::File(resolve_path(base_dir, Path::new(path))));
    }

    if locator.contains("://") {
        let url = Url::parse(locator).map_err(|err| invalid(err.to_string()))?;
        return match url.scheme() {
            "http" | "https" => Ok(SourceLocator::Http(url)),
            other => Err(invalid(format!("scheme {other} is not supported"))),
        };
    }

    Ok(SourceLocator::File(resolve_path(base_dir, Path::new(locator))))
}

pub fn resolve_path(base_dir: Option<&Path>, maybe_relative: &Path) -> PathBuf {
    match base_dir {
        Some(base) if maybe_relative.is_relative() => base.join(maybe_relative),
        _ => maybe_relative.to_path_buf(),
    }
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_run_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_every_region() {
        let registry = Registry::builtin().expect("bundled registry must load");
        assert_eq!(registry.regions().len(), 14);

        let bay = registry.get("BayArea").expect("BayArea region");
        assert_eq!(bay.name, "Northern California");
        assert_eq!(bay.timezone, chrono_tz::America::Los_Angeles);
        assert_eq!(
            bay.source_locator.to_string(),
            "https://19hz.info/events_BayArea.csv"
        );
        assert_eq!(
            registry.get("Phoenix").map(|r| r.timezone),
            Some(chrono_tz::America::Phoenix)
        );
    }

    #[test]
    fn unknown_timezone_is_a_config_error() {
        let text = r#"
[[regions]]
id = "Nowhere"
source_locator = "https://example.com/feed.csv"
timezone = "Mars/Olympus_Mons"
"#;
        let err = Registry::from_toml_str(text, "test", None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTimezone { ref region, .. } if region == "Nowhere"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = r#"
[[regions]]
id = "Seattle"
source_locator = "a.csv"
timezone = "America/Los_Angeles"

[[regions]]
id = "Seattle"
source_locator = "b.csv"
timezone = "America/Los_Angeles"
"#;
        let err = Registry::from_toml_str(text, "test", None).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRegion(id) if id == "Seattle"));
    }

    #[test]
    fn empty_registry_is_rejected() {
        let err = Registry::from_toml_str("", "test", None).unwrap_err();
        assert!(matches!(err, ConfigError::NoRegions));
    }

    #[test]
    fn relative_file_locators_resolve_against_config_dir() {
        let text = r#"
[fetch]
run_timeout_secs = 5

[[regions]]
id = "Local"
source_locator = "feeds/local.csv"
timezone = "America/Chicago"
"#;
        let registry = Registry::from_toml_str(text, "test", Some(Path::new("/etc/revents")))
            .expect("registry must load");
        let region = &registry.regions()[0];
        assert_eq!(region.name, "Local");
        assert_eq!(
            region.source_locator,
            SourceLocator::File(PathBuf::from("/etc/revents/feeds/local.csv"))
        );
        assert_eq!(registry.fetch().run_timeout(), Duration::from_secs(5));
        assert_eq!(registry.fetch().timeout_secs, 20);
    }

    #[test]
    fn unsupported_scheme_and_zero_timeout_are_rejected() {
        let ftp = r#"
[[regions]]
id = "Old"
source_locator = "ftp://example.com/feed.csv"
timezone = "UTC"
"#;
        assert!(matches!(
            Registry::from_toml_str(ftp, "test", None),
            Err(ConfigError::InvalidLocator { .. })
        ));

        let zero = r#"
[fetch]
timeout_secs = 0

[[regions]]
id = "Old"
source_locator = "feed.csv"
timezone = "UTC"
"#;
        assert!(matches!(
            Registry::from_toml_str(zero, "test", None),
            Err(ConfigError::ZeroTimeout("timeout_secs"))
        ));
    }

    #[test]
    fn retain_narrows_or_fails() {
        let registry = Registry::builtin().expect("bundled registry must load");
        let only = registry.clone().retain("CHI").expect("CHI exists");
        assert_eq!(only.regions().len(), 1);
        assert!(matches!(
            registry.retain("Atlantis"),
            Err(ConfigError::NoMatchingRegion(_))
        ));
    }
}
