use tokio::sync::RwLock;
use tracing::{debug, info};

use super::LanguageEntry;

/// In-memory copy of the provider's language list.
///
/// Entries are stored exactly as fetched so cached and uncached listings are
/// identical. Invalidated by the scheduled refresh job.
pub struct LanguageCache {
    languages: RwLock<Option<Vec<LanguageEntry>>>,
}

impl LanguageCache {
    pub fn new() -> Self {
        Self {
            languages: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<Vec<LanguageEntry>> {
        let cached = self.languages.read().await.clone();
        if cached.is_some() {
            debug!("Language list served from cache");
        }
        cached
    }

    pub async fn store(&self, languages: Vec<LanguageEntry>) {
        info!("Cached {} languages", languages.len());
        *self.languages.write().await = Some(languages);
    }

    pub async fn invalidate(&self) {
        if self.languages.write().await.take().is_some() {
            info!("Language cache invalidated");
        }
    }
}
