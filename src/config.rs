use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::de::value::MapAccessDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

use crate::cleanup::{ArchiveInclusion, Policy, RetentionOptions, Target};

/// Configuration file names searched in the working directory, in order.
const CANDIDATES: [&str; 4] = [
    "pipeline-janitor.yml",
    "pipeline-janitor.yaml",
    "pipeline-janitor.toml",
    "pipeline-janitor.json",
];

/// Retention policy file.
///
/// Unknown keys are rejected everywhere, so a misspelled option (e.g. `excludes`)
/// fails loudly instead of being ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// GitLab instance URL or bare host name
    #[serde(default = "default_host")]
    pub host: String,

    /// GitLab access token with `api` scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Worker pool size (defaults to twice the CPU parallelism)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Default retention policy
    pub options: Policy,

    /// Projects and groups to clean up
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// One entry of `targets`: exactly one of `project` or `group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupSpec>,

    /// Overrides for the default policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RetentionOptions>,
}

/// `project: group/name` or `project: { name: group/name }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProjectSpec {
    Path(String),
    Detailed(ProjectDetails),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectDetails {
    pub name: String,
}

/// `group: name` or `group: { name, recursive, exclude, archived }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GroupSpec {
    Path(String),
    Detailed(GroupDetails),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GroupDetails {
    pub name: String,

    /// Include projects of subgroups
    #[serde(default)]
    pub recursive: bool,

    /// Full project paths to leave alone
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude: BTreeSet<String>,

    /// Archived projects: `only`, `include` (default) or `exclude`
    #[serde(default)]
    pub archived: ArchiveInclusion,
}

/// A target written either as a bare path or as a table of details.
///
/// Tables are deserialized straight into the details struct, so its
/// errors (unknown fields, bad enum values) reach the user unchanged.
trait PathOrDetails: Sized {
    type Details: DeserializeOwned;

    const EXPECTING: &'static str;

    fn from_path(path: String) -> Self;

    fn from_details(details: Self::Details) -> Self;
}

impl PathOrDetails for ProjectSpec {
    type Details = ProjectDetails;

    const EXPECTING: &'static str = "a project path or a table with `name`";

    fn from_path(path: String) -> Self {
        Self::Path(path)
    }

    fn from_details(details: ProjectDetails) -> Self {
        Self::Detailed(details)
    }
}

impl PathOrDetails for GroupSpec {
    type Details = GroupDetails;

    const EXPECTING: &'static str =
        "a group path or a table with `name`, `recursive`, `exclude` and `archived`";

    fn from_path(path: String) -> Self {
        Self::Path(path)
    }

    fn from_details(details: GroupDetails) -> Self {
        Self::Detailed(details)
    }
}

struct PathOrDetailsVisitor<T>(PhantomData<T>);

impl<'de, T: PathOrDetails> Visitor<'de> for PathOrDetailsVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(T::EXPECTING)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<T, E> {
        Ok(T::from_path(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<T, E> {
        Ok(T::from_path(value))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<T, A::Error> {
        T::Details::deserialize(MapAccessDeserializer::new(map)).map(T::from_details)
    }
}

impl<'de> Deserialize<'de> for ProjectSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(PathOrDetailsVisitor(PhantomData))
    }
}

impl<'de> Deserialize<'de> for GroupSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(PathOrDetailsVisitor(PhantomData))
    }
}

fn default_host() -> String {
    "https://gitlab.com".to_string()
}

impl TargetConfig {
    fn to_target(&self) -> Result<(Target, Option<RetentionOptions>)> {
        let target = match (&self.project, &self.group) {
            (Some(ProjectSpec::Path(name)), None)
            | (Some(ProjectSpec::Detailed(ProjectDetails { name })), None) => Target::Project {
                name: name.clone(),
            },
            (None, Some(GroupSpec::Path(name))) => Target::Group {
                name: name.clone(),
                recursive: false,
                exclude: BTreeSet::new(),
                archived: ArchiveInclusion::default(),
            },
            (None, Some(GroupSpec::Detailed(group))) => Target::Group {
                name: group.name.clone(),
                recursive: group.recursive,
                exclude: group.exclude.clone(),
                archived: group.archived,
            },
            _ => bail!("either a project or a group is required"),
        };

        Ok((target, self.options.clone()))
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./pipeline-janitor.yml, .yaml, .toml, .json
    /// 3. `<config dir>/pipeline-janitor/config.yml` (e.g. ~/.config on Linux)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let found = Self::discover(Path::new("."))
            .or_else(|| Self::user_config_path().filter(|path| path.exists()));

        match found {
            Some(path) => Self::load_from_path(&path),
            None => bail!("No configuration file found; run `pipeline-janitor init` to create one"),
        }
    }

    /// First candidate configuration file present in `dir`.
    fn discover(dir: &Path) -> Option<PathBuf> {
        CANDIDATES
            .iter()
            .map(|candidate| dir.join(candidate))
            .find(|path| path.exists())
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pipeline-janitor").join("config.yml"))
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let config: Self = match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            _ => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
        };

        config
            .targets()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            _ => serde_yaml::to_string(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Declared targets paired with their policy overrides, in file order.
    pub fn targets(&self) -> Result<Vec<(Target, Option<RetentionOptions>)>> {
        self.targets
            .iter()
            .enumerate()
            .map(|(index, target)| {
                target
                    .to_target()
                    .with_context(|| format!("Invalid target #{}", index + 1))
            })
            .collect()
    }

    /// Starter configuration written by `init`.
    pub fn sample() -> Self {
        Self {
            host: default_host(),
            token: Some(String::new()),
            workers: None,
            options: Policy {
                keep_last: 20,
                max_age: Duration::days(30),
                skip_statuses: BTreeSet::from(["pending".to_string(), "running".to_string()]),
            },
            targets: vec![
                TargetConfig {
                    project: Some(ProjectSpec::Path("mygroup/myproject".to_string())),
                    group: None,
                    options: Some(RetentionOptions {
                        delete_older_than: Some(Duration::days(7)),
                        ..RetentionOptions::default()
                    }),
                },
                TargetConfig {
                    project: None,
                    group: Some(GroupSpec::Path("mygroup".to_string())),
                    options: None,
                },
            ],
        }
    }
}
