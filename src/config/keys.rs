//! Environment variable names shared by the env-file, the process
//! environment and the `key=value` flag lists.

pub const MONGO_URI: &str = "MONGO_URI";
pub const MONGO_OUTPUT_FOLDER: &str = "MONGO_OUTPUT_FOLDER";
pub const MONGO_DUMP_BUCKET: &str = "MONGO_DUMP_BUCKET";

pub const AZURE_STORAGE_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_REGION: &str = "AWS_REGION";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const GOOGLE_REGION: &str = "GOOGLE_REGION";

pub const EMAIL: &str = "EMAIL";
pub const SMTP_RELAY: &str = "SMTP_RELAY";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

pub const AWS: &[&str] = &[AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_REGION];
pub const GCP: &[&str] = &[GOOGLE_APPLICATION_CREDENTIALS, GOOGLE_REGION];
pub const TELEGRAM: &[&str] = &[TELEGRAM_TOKEN, TELEGRAM_CHAT_ID];

pub fn is_cloud(key: &str) -> bool {
    key == AZURE_STORAGE_CONNECTION_STRING || AWS.contains(&key) || GCP.contains(&key)
}
