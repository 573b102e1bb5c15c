//! Periodic refresh + match

use domain_goods::MongoGoodsService;
use eyre::Result;
use observability::GoodsMetrics;
use std::time::Instant;
use tokio::signal;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

const JOB_NAME: &str = "refresh_and_match";

/// Run refresh then match on `cron_expr` until SIGINT/SIGTERM
pub async fn run_scheduled(service: MongoGoodsService, cron_expr: &str) -> Result<()> {
    info!(cron = cron_expr, "Starting scheduled matching");

    let mut sched = JobScheduler::new().await?;

    let job = Job::new_async(cron_expr, move |_uuid, _l| {
        let service = service.clone();
        Box::pin(async move {
            run_once(&service).await;
        })
    })?;

    sched.add(job).await?;
    sched.start().await?;

    info!("Scheduler started, waiting for jobs...");
    wait_for_signal().await;

    info!("Stopping scheduler");
    sched.shutdown().await?;
    Ok(())
}

/// One scheduled tick; failures are logged and counted, never fatal
pub async fn run_once(service: &MongoGoodsService) {
    let started = Instant::now();

    let refresh = match service.refresh_item_info().await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Scheduled refresh failed");
            GoodsMetrics::record_job_failed(JOB_NAME);
            return;
        }
    };

    match service.match_all().await {
        Ok(report) => {
            for (client_id, matches) in &report.notifications {
                let posts: usize = matches.iter().map(|m| m.post_ids.len()).sum();
                info!(%client_id, items = matches.len(), posts, "Client has new posts");
            }
            info!(
                posts_added = refresh.posts_added,
                clients = report.notifications.len(),
                "Scheduled run complete"
            );
            GoodsMetrics::record_job_completed(JOB_NAME, started.elapsed().as_secs_f64());
        }
        Err(e) => {
            error!(error = %e, "Scheduled match failed");
            GoodsMetrics::record_job_failed(JOB_NAME);
        }
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
