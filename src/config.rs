use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::dates::DateLocale;
use crate::import::ParseOptions;
use crate::logging;
use crate::model::NamePolicy;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "contact-hub";

#[derive(Debug, Clone)]
pub struct Config {
    /// File the settings came from; `None` when running on built-in defaults.
    pub config_path: Option<PathBuf>,
    pub library_dir: PathBuf,
    pub parse: ParseOptions,
    pub threads: Option<usize>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            library_dir: PathBuf::from("."),
            parse: ParseOptions::default(),
            threads: None,
            log_level: logging::DEFAULT_LEVEL.to_string(),
        }
    }
}

// =============================================================================
// File deserialization
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    library_dir: Option<String>,
    locale: Option<String>,
    parse: ParseFile,
    log: LogFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ParseFile {
    csv_unnamed: Option<String>,
    vcard_unnamed: Option<String>,
    threads: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LogFile {
    level: Option<String>,
}

impl ConfigFile {
    fn into_config(self, config_path: PathBuf) -> Result<Config> {
        let defaults = Config::default();
        let mut parse = defaults.parse;

        if let Some(policy) = self.parse.csv_unnamed.as_deref() {
            parse.csv_unnamed = policy
                .parse::<NamePolicy>()
                .context("invalid parse.csv_unnamed")?;
        }
        if let Some(policy) = self.parse.vcard_unnamed.as_deref() {
            parse.vcard_unnamed = policy
                .parse::<NamePolicy>()
                .context("invalid parse.vcard_unnamed")?;
        }
        if let Some(locale) = self.locale.as_deref() {
            parse.locale = locale.parse::<DateLocale>().context("invalid locale")?;
        }

        if self.parse.threads == Some(0) {
            bail!("parse.threads must be at least 1");
        }

        let log_level = match self.log.level {
            Some(level) => {
                logging::normalize_level(&level).context("invalid log.level")?;
                level
            }
            None => defaults.log_level,
        };

        let library_dir = self
            .library_dir
            .map(|dir| expand_tilde(Path::new(dir.trim())))
            .unwrap_or(defaults.library_dir);

        Ok(Config {
            config_path: Some(config_path),
            library_dir,
            parse,
            threads: self.parse.threads,
            log_level,
        })
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration. An explicitly named file must exist; the default file
/// is optional and its absence means built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse_str(&raw, path)
}

fn parse_str(raw: &str, path: PathBuf) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    cfg_file.into_config(path)
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    warn_unknown_in_section(value, "", &["library_dir", "locale", "parse", "log"]);

    if let Some(parse_val) = table.get("parse") {
        warn_unknown_in_section(parse_val, "parse", &["csv_unnamed", "vcard_unnamed", "threads"]);
    }

    if let Some(log_val) = table.get("log") {
        warn_unknown_in_section(log_val, "log", &["level"]);
    }
}

fn warn_unknown_in_section(value: &toml::Value, section: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known: HashSet<&str> = known.iter().copied().collect();

    for key in table.keys() {
        if !known.contains(key.as_str()) {
            if section.is_empty() {
                eprintln!("warning: unknown configuration key `{}`", key);
            } else {
                eprintln!("warning: unknown configuration key `{}.{}`", section, key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Config> {
        parse_str(raw, PathBuf::from("test.toml"))
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.parse, ParseOptions::default());
        assert_eq!(config.parse.csv_unnamed, NamePolicy::Drop);
        assert_eq!(config.parse.vcard_unnamed, NamePolicy::Placeholder);
        assert_eq!(config.library_dir, PathBuf::from("."));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.config_path, Some(PathBuf::from("test.toml")));
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
library_dir = "/srv/contacts"
locale = "en-GB"

[parse]
csv_unnamed = "placeholder"
vcard_unnamed = "drop"
threads = 4

[log]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.library_dir, PathBuf::from("/srv/contacts"));
        assert_eq!(config.parse.locale, DateLocale::EnGb);
        assert_eq!(config.parse.csv_unnamed, NamePolicy::Placeholder);
        assert_eq!(config.parse.vcard_unnamed, NamePolicy::Drop);
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse("[parse]\ncsv_unnamed = \"maybe\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("unknown name policy `maybe`"));

        assert!(parse("locale = \"xx\"\n").is_err());
        assert!(parse("[parse]\nthreads = 0\n").is_err());
        assert!(parse("[log]\nlevel = \"loud\"\n").is_err());
        assert!(parse("library_dir = [").is_err());
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        assert!(parse("colour = \"blue\"\n[parse]\nspeed = 3\n").is_ok());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        assert!(load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde(Path::new("/a/b")), PathBuf::from("/a/b"));
    }
}
