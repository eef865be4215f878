use std::sync::Arc;

use crate::scheduler::Scheduler;
use crate::translate::cache::LanguageCache;

/// Periodically drop the cached language list so it is refetched on next use
pub async fn register_cache_refresh(
    scheduler: &mut Scheduler,
    cron_expr: &str,
    cache: Arc<LanguageCache>,
) -> anyhow::Result<()> {
    scheduler
        .every(cron_expr, "language-cache-refresh", move || {
            let cache = cache.clone();
            Box::pin(async move {
                cache.invalidate().await;
            })
        })
        .await
}
