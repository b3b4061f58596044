use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::use_cases::assets::AssetHandler;

/// Runs the eviction pass on a fixed schedule. Passes run back to back on
/// this one task, so two never overlap.
pub async fn start_eviction_task(handler: AssetHandler, max_size_mb: f64, every: Duration) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match handler.cleanup_old_images(max_size_mb).await {
            Ok(report) if !report.deleted.is_empty() => tracing::info!(
                "Evicted {} assets ({} -> {} bytes)",
                report.deleted.len(), report.bytes_before, report.bytes_after
            ),
            Ok(_) => tracing::debug!("Scheduled eviction found nothing to evict"),
            Err(e) => tracing::error!("Scheduled eviction failed: {}", e)
        }
    }
}
