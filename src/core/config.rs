//! Layered configuration
//!
//! Values are merged from lowest to highest precedence: built-in defaults,
//! the user config file, the project `.difftrack/config.yaml`, and finally
//! `DIFFTRACK_*` environment variables.

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::calendar::DEFAULT_WINDOW_DAYS;
use crate::core::project::Project;
use crate::core::volume::DEFAULT_ML_PER_PLATE;

const ENV_PREFIX: &str = "DIFFTRACK_";

/// Keys an environment variable may override; other `DIFFTRACK_*` variables
/// (password, log filter) belong to the CLI
const ENV_KEYS: &[&str] = &[
    "store",
    "data_dir",
    "protocol",
    "calendar_days",
    "ml_per_plate",
    "image_prefix",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown store backend '{0}' (expected 'csv' or 'sqlite')")]
    UnknownStore(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

/// Which storage adapter holds batches and accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum StoreKind {
    #[default]
    Csv,
    Sqlite,
}

impl std::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(StoreKind::Csv),
            "sqlite" | "workbook" => Ok(StoreKind::Sqlite),
            other => Err(ConfigError::UnknownStore(other.to_string())),
        }
    }
}

impl TryFrom<String> for StoreKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Csv => write!(f, "csv"),
            StoreKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreKind,

    /// Store location, relative to the project root unless absolute
    pub data_dir: PathBuf,

    /// Protocol table, relative to the project root unless absolute
    pub protocol: PathBuf,

    pub calendar_days: u32,

    pub ml_per_plate: f64,

    /// Day marker in image file names (`_D7_`)
    pub image_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreKind::Csv,
            data_dir: PathBuf::from("data"),
            protocol: PathBuf::from("protocol.csv"),
            calendar_days: DEFAULT_WINDOW_DAYS,
            ml_per_plate: DEFAULT_ML_PER_PLATE,
            image_prefix: "D".to_string(),
        }
    }
}

impl Config {
    /// Load configuration for the current directory's project, if any
    pub fn load() -> Result<Self, ConfigError> {
        let project = Project::discover().ok();
        Self::load_for(project.as_ref())
    }

    /// Load configuration for a given project
    pub fn load_for(project: Option<&Project>) -> Result<Self, ConfigError> {
        Self::figment(project)
            .extract()
            .map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    /// Provider chain, lowest precedence first
    pub fn figment(project: Option<&Project>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let files = Self::user_config_path()
            .into_iter()
            .chain(project.map(Project::config_path));
        for path in files.filter(|p| has_content(p)) {
            debug!(path = %path.display(), "merging config layer");
            figment = figment.merge(Yaml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).only(ENV_KEYS))
    }

    /// `<config_dir>/difftrack/config.yaml` for the current user
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "difftrack").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Reject values no command can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calendar_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "calendar_days",
                value: self.calendar_days.to_string(),
            });
        }
        if !self.ml_per_plate.is_finite() || self.ml_per_plate <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "ml_per_plate",
                value: self.ml_per_plate.to_string(),
            });
        }
        if self.image_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "image_prefix",
                value: self.image_prefix.clone(),
            });
        }
        Ok(())
    }

    pub fn data_path(&self, project: &Project) -> PathBuf {
        project.resolve(&self.data_dir)
    }

    pub fn protocol_path(&self, project: &Project) -> PathBuf {
        project.resolve(&self.protocol)
    }
}

// An empty YAML file is null, which no layer can merge
fn has_content(path: &Path) -> bool {
    std::fs::read_to_string(path).is_ok_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn isolate(jail: &mut Jail) {
        let xdg = jail.directory().join("xdg");
        jail.set_env("XDG_CONFIG_HOME", xdg.display());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store, StoreKind::Csv);
        assert_eq!(config.calendar_days, 22);
        assert_eq!(config.ml_per_plate, 4.0);
        assert_eq!(config.image_prefix, "D");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_figment_without_files() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let config = Config::load_for(None).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_project_layer_overrides_defaults() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let project = Project::init(jail.directory()).unwrap();
            std::fs::write(
                project.config_path(),
                "store: sqlite\ncalendar_days: 30\nimage_prefix: DAY\n",
            )
            .unwrap();

            let config = Config::load_for(Some(&project)).unwrap();
            assert_eq!(config.store, StoreKind::Sqlite);
            assert_eq!(config.calendar_days, 30);
            assert_eq!(config.image_prefix, "DAY");
            assert_eq!(config.protocol, PathBuf::from("protocol.csv"));
            Ok(())
        });
    }

    #[test]
    fn test_user_layer_below_project_layer() {
        Jail::expect_with(|jail| {
            isolate(jail);
            std::fs::create_dir_all(jail.directory().join("xdg/difftrack")).unwrap();
            jail.create_file("xdg/difftrack/config.yaml", "calendar_days: 14\nml_per_plate: 2.5\n")?;
            let project = Project::init(jail.directory()).unwrap();
            std::fs::write(project.config_path(), "calendar_days: 30\n").unwrap();

            let config = Config::load_for(Some(&project)).unwrap();
            assert_eq!(config.calendar_days, 30);
            assert_eq!(config.ml_per_plate, 2.5);
            Ok(())
        });
    }

    #[test]
    fn test_empty_project_file_is_skipped() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let project = Project::init(jail.directory()).unwrap();
            std::fs::write(project.config_path(), "\n").unwrap();
            assert_eq!(Config::load_for(Some(&project)).unwrap(), Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let project = Project::init(jail.directory()).unwrap();
            std::fs::write(project.config_path(), "store: csv\n").unwrap();
            jail.set_env("DIFFTRACK_STORE", "SQLite");
            jail.set_env("DIFFTRACK_PROTOCOL", "/srv/protocol.yaml");
            jail.set_env("DIFFTRACK_PASSWORD", "not-a-setting");

            let config = Config::load_for(Some(&project)).unwrap();
            assert_eq!(config.store, StoreKind::Sqlite);
            assert_eq!(config.protocol, PathBuf::from("/srv/protocol.yaml"));
            assert_eq!(config.data_dir, PathBuf::from("data"));
            Ok(())
        });
    }

    #[test]
    fn test_env_rejects_unknown_store() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.set_env("DIFFTRACK_STORE", "gsheet");
            let result = Config::load_for(None);
            assert!(matches!(result, Err(ConfigError::Figment(_))));
            Ok(())
        });
    }

    #[test]
    fn test_store_kind_aliases() {
        assert_eq!("Workbook".parse::<StoreKind>().unwrap(), StoreKind::Sqlite);
        assert!(matches!(
            "gsheet".parse::<StoreKind>(),
            Err(ConfigError::UnknownStore(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = Config {
            calendar_days: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
