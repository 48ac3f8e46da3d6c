//! Run report logged after the output stage.

use std::time::Duration;

use tracing::info;

use crate::classify::ResultsClassification;

/// `1h 2m 3s`, omitting leading zero units; `0s` for zero.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    let mut parts = Vec::new();
    if h > 0 {
        parts.push(format!("{h}h"));
    }
    if h > 0 || m > 0 {
        parts.push(format!("{m}m"));
    }
    parts.push(format!("{s}s"));
    parts.join(" ")
}

pub fn log_report(classification: &ResultsClassification, dry_run: bool) {
    let verb = if dry_run { "would change" } else { "changed" };
    for result in classification.in_patch_order() {
        let path = match (&result.before, &result.after) {
            (Some(b), Some(a)) if b.path() != a.path() => {
                format!("{} -> {}", b.path().display(), a.path().display())
            }
            (_, Some(u)) | (Some(u), None) => u.path().display().to_string(),
            (None, None) => continue,
        };
        info!("report: {verb} {path} by {}", result.rules.join(", "));
    }
    info!(
        "report: {} file(s), estimated time saved {}",
        classification.len(),
        format_duration(classification.total_time_saved())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_render_compactly() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_secs(300)), "5m 0s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 2m 3s");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2h 0m 0s");
    }
}
