use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::config::RunConfig;
use crate::dump::{DumpOutcome, MongoDump};
use crate::error::{RunError, UploadError};
use crate::notify::Notifier;
use crate::progress::UploadProgress;
use crate::storage::{UploadSummary, Uploader};

pub mod report;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub dump: DumpOutcome,
    pub uploads: Vec<(&'static str, UploadSummary)>,
    pub elapsed: Duration,
    pub notifications: usize,
}

/// Builds every collaborator from the configuration, then prepares the
/// buckets and runs dump, upload and notify in sequence.
pub async fn run(config: &RunConfig) -> Result<RunReport, RunError> {
    let dump = MongoDump::new(config)?;
    let uploaders = config
        .targets
        .iter()
        .map(|target| Uploader::from_target(target, &config.bucket))
        .collect::<Result<Vec<_>, _>>()?;
    let notifier = Notifier::from_config(config);

    execute(config, &dump, &uploaders, &notifier).await
}

pub async fn execute(
    config: &RunConfig,
    dump: &MongoDump,
    uploaders: &[Uploader],
    notifier: &Notifier,
) -> Result<RunReport, RunError> {
    let start = Instant::now();
    report::print_plan(config);

    if let Err(e) = prepare_buckets(uploaders).await {
        return Err(abort(dump, None, notifier, e.into()).await);
    }

    let outcome = match dump.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            let e = RunError::from(e);
            return Err(abort(dump, None, notifier, e).await);
        }
    };
    info!(
        "Dump stored at {} ({} in {} files)",
        outcome.path.display(),
        report::format_size(outcome.stats.bytes),
        outcome.stats.files
    );

    let uploads = match upload_all(config, &outcome, uploaders).await {
        Ok(uploads) => uploads,
        Err(e) => {
            let e = RunError::from(e);
            return Err(abort(dump, Some(&outcome), notifier, e).await);
        }
    };

    let mut run_report = RunReport {
        dump: outcome,
        uploads,
        elapsed: start.elapsed(),
        notifications: 0,
    };
    run_report.notifications = notifier.send(&report::success_message(&run_report)).await;
    dump.cleanup(Some(&run_report.dump)).await;

    report::print_summary(config, &run_report);
    Ok(run_report)
}

async fn prepare_buckets(uploaders: &[Uploader]) -> Result<(), UploadError> {
    for uploader in uploaders {
        uploader.ensure_bucket().await?;
    }
    Ok(())
}

async fn upload_all(
    config: &RunConfig,
    outcome: &DumpOutcome,
    uploaders: &[Uploader],
) -> Result<Vec<(&'static str, UploadSummary)>, UploadError> {
    let prefix = outcome
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);
    let progress = UploadProgress::new(outcome.stats.bytes, config.silent);
    let mut uploads = Vec::with_capacity(uploaders.len());

    for uploader in uploaders {
        progress.restart();
        match uploader
            .upload_dir(&outcome.path, prefix.as_deref(), &progress)
            .await
        {
            Ok(summary) => uploads.push((uploader.provider(), summary)),
            Err(e) => {
                progress.fail(&format!("Upload to {} failed", uploader.provider()));
                return Err(e);
            }
        }
    }

    progress.finish("Upload completed");
    Ok(uploads)
}

async fn abort(
    dump: &MongoDump,
    outcome: Option<&DumpOutcome>,
    notifier: &Notifier,
    e: RunError,
) -> RunError {
    error!("{e}");
    notifier.send(&report::failure_message(&e)).await;
    dump.cleanup(outcome).await;
    e
}
