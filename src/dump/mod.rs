#[cfg(test)]
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::{redact_uri, RunConfig};
use crate::error::DumpError;

mod folder;
mod probe;

pub use folder::FolderStats;

pub const MONGODUMP: &str = "mongodump";

/// A finished dump, already moved to its dated directory.
#[derive(Debug, Clone)]
pub struct DumpOutcome {
    pub path: PathBuf,
    pub stats: FolderStats,
}

/// Wraps one `mongodump --uri=.. --gzip --out ..` invocation.
#[derive(Debug, Clone)]
pub struct MongoDump {
    program: String,
    leading_args: Vec<String>,
    uri: String,
    output_dir: PathBuf,
    probe: bool,
}

impl MongoDump {
    pub fn new(config: &RunConfig) -> Result<Self, DumpError> {
        let output_dir = if config.output_dir.is_absolute() {
            config.output_dir.clone()
        } else {
            std::env::current_dir()
                .map_err(|source| DumpError::Filesystem {
                    path: config.output_dir.clone(),
                    source,
                })?
                .join(&config.output_dir)
        };

        Ok(Self {
            program: MONGODUMP.to_string(),
            leading_args: Vec::new(),
            uri: config.uri.clone(),
            output_dir,
            probe: true,
        })
    }

    /// Runs `program leading_args.. <mongodump args>` instead of `mongodump`.
    #[cfg(test)]
    pub fn with_command<I, S>(mut self, program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.into();
        self.leading_args = leading_args.into_iter().map(Into::into).collect();
        self
    }

    #[cfg(test)]
    pub fn without_probe(mut self) -> Self {
        self.probe = false;
        self
    }

    #[cfg(test)]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn args(&self) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push(format!("--uri={}", self.uri));
        args.push("--gzip".to_string());
        args.push("--out".to_string());
        args.push(self.output_dir.display().to_string());
        args
    }

    /// Dumps the database, then renames the output to today's dated folder.
    pub async fn run(&self) -> Result<DumpOutcome, DumpError> {
        if self.probe {
            probe::probe(&self.uri).await?;
        }

        info!(
            "Running {} against {} into {}",
            self.program,
            redact_uri(&self.uri),
            self.output_dir.display()
        );
        self.invoke().await?;

        if !self.output_dir.is_dir() {
            return Err(DumpError::MissingOutput {
                path: self.output_dir.clone(),
            });
        }

        let stats = folder::folder_stats(&self.output_dir)?;
        let path = folder::stamp(&self.output_dir, Local::now().date_naive()).await?;
        Ok(DumpOutcome { path, stats })
    }

    async fn invoke(&self) -> Result<(), DumpError> {
        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DumpError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let (_, stderr) = futures::future::join(
            drain(child.stdout.take(), false),
            drain(child.stderr.take(), true),
        )
        .await;

        let status = child.wait().await.map_err(|source| DumpError::Wait {
            program: self.program.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(DumpError::Failed {
                exit_code: status.code(),
                stderr: stderr.trim_end().to_string(),
            })
        }
    }

    /// Removes the raw output directory and the dated one, if present.
    pub async fn cleanup(&self, outcome: Option<&DumpOutcome>) {
        let mut paths = vec![self.output_dir.as_path()];
        if let Some(outcome) = outcome {
            paths.push(outcome.path.as_path());
        }
        folder::cleanup(&paths).await;
    }
}

/// Forwards the child's output to the log line by line, optionally keeping it.
/// Bytes that are not UTF-8 are replaced, the pipe is always read to the end.
async fn drain<R>(reader: Option<R>, capture: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let mut captured = String::new();
    let Some(reader) = reader else {
        return captured;
    };

    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&raw);
                let line = line.trim_end_matches(['\r', '\n']);
                info!(target: "mongodump", "{line}");
                if capture {
                    captured.push_str(line);
                    captured.push('\n');
                }
            }
            Err(e) => {
                warn!("Stopped reading mongodump output: {e}");
                break;
            }
        }
    }
    captured
}

#[cfg(test)]
pub(crate) mod testing {
    /// Shell body standing in for `mongodump`: picks up `--out` and writes
    /// a small two-database dump below it.
    pub const FAKE_MONGODUMP_OK: &str = r#"
for arg in "$@"; do
  if [ "$prev" = "--out" ]; then out="$arg"; fi
  prev="$arg"
done
echo "writing admin.system.users to $out" >&2
mkdir -p "$out/admin" "$out/shop"
printf 'users' > "$out/admin/system.users.bson.gz"
printf 'meta' > "$out/admin/system.users.metadata.json.gz"
printf 'orders!' > "$out/shop/orders.bson.gz"
"#;

    pub const FAKE_MONGODUMP_FAIL: &str = r#"
echo "Failed: error connecting to db server: no reachable servers" >&2
exit 3
"#;

    pub const FAKE_MONGODUMP_GARBLED: &str = r#"
printf 'reading \377\376 namespace\n' >&2
echo "Failed: authentication failed" >&2
exit 1
"#;

    pub fn sh_args(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string(), "mongodump".to_string()]
    }
}
