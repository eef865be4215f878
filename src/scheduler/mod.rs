//! Cron-driven maintenance jobs.
//!
//! The bot keeps no state between messages except the optional language-list
//! cache, so the only job today is the cache refresh in [`tasks`].

pub mod tasks;

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};

type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Owns the cron runner for the lifetime of the bot process
pub struct Scheduler {
    inner: JobScheduler,
    jobs: Vec<String>,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self {
            inner,
            jobs: Vec::new(),
        })
    }

    /// Run `task` on every tick of `cron_expr` (seconds field first, e.g.
    /// `0 0 */6 * * *`). Each tick builds a fresh future from `task`.
    pub async fn every<F>(&mut self, cron_expr: &str, name: &str, task: F) -> Result<()>
    where
        F: Fn() -> JobFuture + Send + Sync + 'static,
    {
        let job_name = name.to_string();
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            debug!("Job '{}' fired", job_name);
            task()
        })
        .with_context(|| format!("Invalid cron expression for '{}': {}", name, cron_expr))?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to register job '{}'", name))?;

        self.jobs.push(name.to_string());
        info!("Job '{}' scheduled ({})", name, cron_expr);
        Ok(())
    }

    /// Names of the registered jobs, in registration order
    pub fn jobs(&self) -> &[String] {
        &self.jobs
    }

    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler running {} job(s)", self.jobs.len());
        Ok(())
    }

    /// Stop firing jobs; called once the Telegram dispatcher has exited
    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_jobs_are_listed() {
        let mut scheduler = Scheduler::new().await.unwrap();
        assert!(scheduler.jobs().is_empty());

        scheduler
            .every("0 0 * * * *", "hourly", || Box::pin(async {}))
            .await
            .unwrap();
        assert_eq!(scheduler.jobs().to_vec(), vec!["hourly".to_string()]);
    }

    #[tokio::test]
    async fn test_bad_expression_not_listed() {
        let mut scheduler = Scheduler::new().await.unwrap();
        let err = scheduler
            .every("every six hours", "broken", || Box::pin(async {}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert!(scheduler.jobs().is_empty());
    }
}
