use std::time::Duration;

use crate::config::{redact_uri, RunConfig};

use super::RunReport;

const SI_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Decimal (SI) size: `999 B`, `1.5 KB`, `12.3 MB`.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1000 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < SI_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{value:.1} {}", SI_UNITS[unit])
}

/// `H:MM:SS`, sub-second precision dropped.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn success_message(report: &RunReport) -> String {
    let providers = report
        .uploads
        .iter()
        .map(|(provider, _)| *provider)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "💥 mongodump-s3 finished the job.\n\
         🦺 Dump size is {} in {} files.\n\
         ☁️ Uploaded to {providers}.\n\
         🌒 Processing time is {}",
        format_size(report.dump.stats.bytes),
        report.dump.stats.files,
        format_elapsed(report.elapsed)
    )
}

pub fn failure_message(error: &dyn std::fmt::Display) -> String {
    format!("💩 mongodump-s3 failed: {error}. Please see logs.")
}

pub fn print_plan(config: &RunConfig) {
    if config.silent {
        return;
    }
    let providers = config
        .targets
        .iter()
        .map(|t| t.provider())
        .collect::<Vec<_>>()
        .join(", ");

    println!("🚀 Starting mongodump-s3");
    println!("📊 Run settings:");
    println!("   • MongoDB: {}", redact_uri(&config.uri));
    println!("   • Output folder: {}", config.output_dir.display());
    println!("   • Bucket: {}", config.bucket);
    println!("   • Providers: {providers}");
    println!(
        "   • Email: {}",
        config.email.as_ref().map_or("off", |e| e.to.as_str())
    );
    println!(
        "   • Telegram: {}",
        if config.telegram.is_some() { "on" } else { "off" }
    );
    println!();
}

pub fn print_summary(config: &RunConfig, report: &RunReport) {
    if config.silent {
        return;
    }
    println!("🎉 Backup completed successfully!");
    for (provider, summary) in &report.uploads {
        println!(
            "   • {provider}: {} files, {} -> bucket '{}'",
            summary.files,
            format_size(summary.bytes),
            config.bucket
        );
    }
    println!("   • Processing time: {}", format_elapsed(report.elapsed));
    if report.notifications > 0 {
        println!("📨 {} notification(s) delivered", report.notifications);
    }
}
