use std::fmt;

use crate::error::ConfigurationError;

use super::keys;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Account credentials extracted from an Azure storage connection string.
#[derive(Clone, PartialEq)]
pub enum AzureCredentials {
    AccountKey { account: String, access_key: String },
    /// `UseDevelopmentStorage=true`, i.e. Azurite on localhost.
    Emulator,
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountKey { account, .. } => f
                .debug_struct("AccountKey")
                .field("account", account)
                .field("access_key", &"***")
                .finish(),
            Self::Emulator => f.write_str("Emulator"),
        }
    }
}

fn invalid(reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Invalid {
        field: keys::AZURE_STORAGE_CONNECTION_STRING,
        reason: reason.into(),
    }
}

/// Parses `AccountName=..;AccountKey=..;EndpointSuffix=..` style strings.
/// Values may contain `=` (base64 padding), so only the first one splits.
pub fn parse_connection_string(raw: &str) -> Result<AzureCredentials, ConfigurationError> {
    let mut account = None;
    let mut access_key = None;

    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, value) = segment
            .split_once('=')
            .ok_or_else(|| invalid(format!("segment '{segment}' is not name=value")))?;

        match name {
            "UseDevelopmentStorage" if value.eq_ignore_ascii_case("true") => {
                return Ok(AzureCredentials::Emulator);
            }
            "AccountName" => account = Some(value.to_string()),
            "AccountKey" => access_key = Some(value.to_string()),
            "EndpointSuffix" if value != DEFAULT_ENDPOINT_SUFFIX => {
                return Err(invalid(format!(
                    "endpoint suffix '{value}' is not supported, only {DEFAULT_ENDPOINT_SUFFIX}"
                )));
            }
            "BlobEndpoint" => {
                return Err(invalid("custom BlobEndpoint is not supported"));
            }
            "SharedAccessSignature" => {
                return Err(invalid("SAS connection strings are not supported, use an account key"));
            }
            _ => {}
        }
    }

    let account = account
        .filter(|a| !a.is_empty())
        .ok_or_else(|| invalid("AccountName is missing"))?;
    let access_key = access_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| invalid("AccountKey is missing"))?;

    Ok(AzureCredentials::AccountKey {
        account,
        access_key,
    })
}
