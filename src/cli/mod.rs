use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Raw startup flags, before they are merged with the env-file and environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub bucket: Option<String>,
    pub out: Option<String>,
    pub uri: Option<String>,
    pub env_file: Option<PathBuf>,
    pub azure: Option<String>,
    pub aws: Option<String>,
    pub gcp: Option<String>,
    pub email: Option<String>,
    pub smtp: Option<String>,
    pub telegram: Option<String>,
    pub silent: bool,
}

impl CliOptions {
    /// True when any cloud storage flag was passed on the command line.
    pub fn has_cloud_flags(&self) -> bool {
        self.azure.is_some() || self.aws.is_some() || self.gcp.is_some()
    }
}

pub fn build_command() -> Command {
    Command::new("mongodump-s3")
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            "Export the content of a running server into .bson files and upload them to \
             Azure, AWS S3 or Google Cloud Storage. By default loads required settings \
             from environment variables.",
        )
        .after_help("Bug reports and discussions: https://github.com/exesse/mongodump-s3")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Print the tool version and exit")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new("bucket")
                .short('b')
                .long("bucket")
                .value_name("BUCKET")
                .help_heading("Output options")
                .help("Bucket or container name for upload, defaults to 'mongodump'"),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("FOLDER")
                .help_heading("Output options")
                .help("Output directory, defaults to 'dump'"),
        )
        .arg(
            Arg::new("uri")
                .short('u')
                .long("uri")
                .value_name("URI")
                .help_heading("URI options")
                .help("MongoDB connection string, see https://docs.mongodb.com/manual/reference/connection-string"),
        )
        .arg(
            Arg::new("env")
                .short('e')
                .long("env")
                .value_name("ENV_FILE")
                .help_heading("Environment options")
                .help("Path to a file containing environment variables"),
        )
        .arg(
            Arg::new("azure")
                .long("azure")
                .value_name("\"CONNECTION_STRING\"")
                .help_heading("Cloud storage options")
                .help("Connection string for the storage account provided by Azure"),
        )
        .arg(
            Arg::new("aws")
                .long("aws")
                .value_name("\"aws_access_key_id=.. aws_secret_access_key=.. aws_region=..\"")
                .help_heading("Cloud storage options")
                .help("AWS IAM credentials, AWS_REGION defaults to 'us-west-2'"),
        )
        .arg(
            Arg::new("gcp")
                .long("gcp")
                .value_name("\"google_application_credentials=.. google_region=..\"")
                .help_heading("Cloud storage options")
                .help("Path to a service account file and optional region, GOOGLE_REGION defaults to 'us'"),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .value_name("USER@EXAMPLE.COM")
                .help_heading("Notification options")
                .help("Email address to notify with the result"),
        )
        .arg(
            Arg::new("smtp")
                .long("smtp")
                .value_name("MAIL_SERVER")
                .help_heading("Notification options")
                .help("SMTP relay to use, defaults to 'localhost'"),
        )
        .arg(
            Arg::new("telegram")
                .long("telegram")
                .value_name("\"telegram_token=.. telegram_chat_id=..\"")
                .help_heading("Notification options")
                .help("Telegram bot token and chat id, see https://core.telegram.org/bots/api"),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Silent mode: no progress bar, warnings and errors only")
                .action(ArgAction::SetTrue),
        )
}

fn options_from_matches(matches: &ArgMatches) -> CliOptions {
    let value = |id: &str| matches.get_one::<String>(id).cloned();

    CliOptions {
        bucket: value("bucket"),
        out: value("out"),
        uri: value("uri"),
        env_file: value("env").map(PathBuf::from),
        azure: value("azure"),
        aws: value("aws"),
        gcp: value("gcp"),
        email: value("email"),
        smtp: value("smtp"),
        telegram: value("telegram"),
        silent: matches.get_flag("silent"),
    }
}

pub fn parse_cli() -> CliOptions {
    let matches = build_command().get_matches();
    options_from_matches(&matches)
}
