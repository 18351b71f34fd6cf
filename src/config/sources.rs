use std::collections::HashMap;
use std::path::Path;

use crate::cli::CliOptions;
use crate::error::ConfigurationError;

use super::keys;

/// The three layers a setting can come from, highest precedence first.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    flags: HashMap<String, String>,
    env_file: HashMap<String, String>,
    env: HashMap<String, String>,
    mask_cloud: bool,
}

impl Sources {
    pub fn new(
        cli: &CliOptions,
        env_file: HashMap<String, String>,
        env: HashMap<String, String>,
    ) -> Result<Self, ConfigurationError> {
        let mut flags = HashMap::new();

        let mut insert = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                flags.insert(key.to_string(), value.clone());
            }
        };
        insert(keys::MONGO_URI, &cli.uri);
        insert(keys::MONGO_OUTPUT_FOLDER, &cli.out);
        insert(keys::MONGO_DUMP_BUCKET, &cli.bucket);
        insert(keys::AZURE_STORAGE_CONNECTION_STRING, &cli.azure);
        insert(keys::EMAIL, &cli.email);
        insert(keys::SMTP_RELAY, &cli.smtp);

        if let Some(raw) = &cli.aws {
            flags.extend(parse_pairs("aws", raw, keys::AWS)?);
        }
        if let Some(raw) = &cli.gcp {
            flags.extend(parse_pairs("gcp", raw, keys::GCP)?);
        }
        if let Some(raw) = &cli.telegram {
            flags.extend(parse_pairs("telegram", raw, keys::TELEGRAM)?);
        }

        Ok(Self {
            flags,
            env_file,
            env,
            mask_cloud: cli.has_cloud_flags(),
        })
    }

    /// Looks a key up as flag, then env-file, then environment. Empty values
    /// count as unset. Cloud keys only come from flags once a cloud flag was
    /// passed, so one provider on the command line cannot pick up another
    /// provider's credentials from the environment.
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = non_empty(&self.flags, key) {
            return Some(value);
        }
        if self.mask_cloud && keys::is_cloud(key) {
            return None;
        }
        non_empty(&self.env_file, key).or_else(|| non_empty(&self.env, key))
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

fn non_empty<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Splits `"key=value key=value"` into upper-cased keys, rejecting keys that
/// do not belong to the flag.
pub fn parse_pairs(
    flag: &'static str,
    raw: &str,
    allowed: &[&str],
) -> Result<Vec<(String, String)>, ConfigurationError> {
    raw.split_whitespace()
        .map(|fragment| {
            let (key, value) = fragment
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| ConfigurationError::MalformedPairs {
                    flag,
                    fragment: fragment.to_string(),
                })?;
            let key = key.to_ascii_uppercase();
            if !allowed.contains(&key.as_str()) {
                return Err(ConfigurationError::UnknownKey { flag, key });
            }
            Ok((key, value.to_string()))
        })
        .collect()
}

/// Parses an env-file into a map without touching the process environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigurationError> {
    let to_error = |source| ConfigurationError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    dotenvy::from_path_iter(path)
        .map_err(to_error)?
        .map(|item| item.map_err(to_error))
        .collect()
}
