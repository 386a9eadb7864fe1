//! Global famcal configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::calendar::{Calendar, CalendarSource, default_selection};
use crate::error::{FamcalError, FamcalResult};
use crate::expand::TimeFormat;

static DEFAULT_LOCAL_STORE: &str = "~/.local/share/famcal/events.json";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_local_store() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_STORE)
}

/// Configuration at ~/.config/famcal/config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamcalConfig {
    /// IANA timezone deciding which day an event falls on.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub time_format: TimeFormat,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_local_store")]
    pub local_store: PathBuf,

    /// Selected calendar ids. Absent means every enabled calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<Vec<String>>,

    #[serde(default)]
    pub calendars: Vec<Calendar>,
}

impl Default for FamcalConfig {
    fn default() -> Self {
        FamcalConfig {
            timezone: default_timezone(),
            time_format: TimeFormat::default(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            local_store: default_local_store(),
            selected: None,
            calendars: Vec::new(),
        }
    }
}

impl FamcalConfig {
    pub fn config_path() -> FamcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FamcalError::Config("Could not determine config directory".into()))?
            .join("famcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, creating a commented default file on first run.
    pub fn load() -> FamcalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path`, with `FAMCAL_*` environment variables on top.
    pub fn load_from(path: &Path) -> FamcalResult<Self> {
        let config: FamcalConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("FAMCAL").try_parsing(true))
            .build()
            .map_err(|e| FamcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FamcalError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> FamcalResult<Self> {
        let config: FamcalConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .map_err(|e| FamcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FamcalError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> FamcalResult<()> {
        self.tz()?;

        let mut ids = HashSet::new();
        for calendar in &self.calendars {
            if calendar.id.trim().is_empty() {
                return Err(FamcalError::Config("Calendar id must not be empty".into()));
            }
            if !ids.insert(calendar.id.as_str()) {
                return Err(FamcalError::Config(format!(
                    "Duplicate calendar id '{}'",
                    calendar.id
                )));
            }
        }

        Ok(())
    }

    pub fn tz(&self) -> FamcalResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| FamcalError::Config(format!("Unknown timezone '{}'", self.timezone)))
    }

    pub fn local_store_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.local_store.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Configured calendars, with the built-in local calendar first when
    /// the config doesn't declare one.
    pub fn calendars(&self) -> Vec<Calendar> {
        let has_local = self
            .calendars
            .iter()
            .any(|c| c.source == CalendarSource::Local);

        let mut calendars = Vec::with_capacity(self.calendars.len() + 1);
        if !has_local {
            calendars.push(Calendar::local());
        }
        calendars.extend(self.calendars.iter().cloned());
        calendars
    }

    /// The effective calendar selection.
    pub fn selection(&self) -> HashSet<String> {
        match &self.selected {
            Some(ids) => ids.iter().cloned().collect(),
            None => default_selection(&self.calendars()),
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> FamcalResult<()> {
        let contents = format!(
            "\
# famcal configuration

# Timezone deciding which day an event falls on:
# timezone = \"UTC\"

# Clock format for event times (\"12h\" or \"24h\"):
# time_format = \"12h\"

# Seconds to wait for one calendar before giving up on it:
# fetch_timeout_secs = {}

# Where locally created events are stored:
# local_store = \"{}\"

# Calendars to show. Leave unset to show every enabled calendar:
# selected = [\"local_calendar\", \"school\"]

# [[calendars]]
# id = \"school\"
# name = \"School\"
# color = \"green\"
# category = \"Kids\"
# source = {{ kind = \"ical\", url = \"webcal://example.com/school.ics\" }}

# [[calendars]]
# id = \"chores\"
# name = \"Chores\"
# source = {{ kind = \"notion\", database = \"https://www.notion.so/...\", token_env = \"NOTION_TOKEN\" }}
",
            DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LOCAL_STORE
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FamcalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| FamcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
