use std::path::PathBuf;

/// Raised while building the run configuration, before any side effect.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{0} is required but was not provided")]
    Missing(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("no cloud storage credentials provided (use --azure, --aws or --gcp)")]
    NoProvider,

    #[error("malformed option --{flag}: expected space separated key=value pairs, got '{fragment}'")]
    MalformedPairs { flag: &'static str, fragment: String },

    #[error("unknown key '{key}' in --{flag}")]
    UnknownKey { flag: &'static str, key: String },

    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Raised by the dump invoker. The run aborts, nothing is uploaded.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("no MongoDB host in {hosts} is accepting connections")]
    Unreachable { hosts: String },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mongodump exited with {}: {stderr}", .exit_code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("dump directory {path} was not produced")]
    MissingOutput { path: PathBuf },

    #[error("failed to prepare dump directory {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raised by the storage uploader on any SDK or local read failure.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to configure {provider} client: {source}")]
    Client {
        provider: &'static str,
        #[source]
        source: object_store::Error,
    },

    #[error("failed to prepare {provider} bucket '{bucket}': {reason}")]
    Bucket {
        provider: &'static str,
        bucket: String,
        reason: String,
    },

    #[error("{provider} rejected {key}: {source}")]
    Store {
        provider: &'static str,
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid object key for {path}: {reason}")]
    Key { path: PathBuf, reason: String },
}

/// Best-effort delivery failures. Logged, never propagated out of a run.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid email address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp relay {relay} failed: {source}")]
    Smtp {
        relay: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },

    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram rejected the message: {0}")]
    Telegram(String),
}

/// The only errors that end a run with a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("dump error: {0}")]
    Dump(#[from] DumpError),

    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
}
