use std::fmt::Display;

use tokio::{
    task::JoinHandle,
    time::{self, Instant},
};

use crate::domain::{
    entities::tracking::CycleSummary,
    repositories::{
        bookmark::BookmarkRepository, feed::FeedRepository, tracking::TrackingRepository,
    },
    services::tracking::{TrackingError, TrackingService},
};

pub enum CycleCommand {
    Run(tokio::sync::oneshot::Sender<Result<CycleSummary, TrackingError>>),
}

impl Display for CycleCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleCommand::Run(_) => write!(f, "CycleCommand::Run"),
        }
    }
}

pub type CycleCommandReceiver = flume::Receiver<CycleCommand>;
pub type CycleCommandSender = flume::Sender<CycleCommand>;

/// Drives one polling cycle per tick. The cadence is decided here, not by the
/// engine; an on-demand cycle can be requested over the command channel.
struct UpdatesWorker<B, T, F>
where
    B: BookmarkRepository + 'static,
    T: TrackingRepository + 'static,
    F: FeedRepository + 'static,
{
    period: u64,
    service: TrackingService<B, T, F>,
    command_rx: CycleCommandReceiver,
}

impl<B, T, F> UpdatesWorker<B, T, F>
where
    B: BookmarkRepository + 'static,
    T: TrackingRepository + 'static,
    F: FeedRepository + 'static,
{
    fn new(period: u64, service: TrackingService<B, T, F>) -> (Self, CycleCommandSender) {
        info!("periodic updates every {} seconds", period);

        let (command_tx, command_rx) = flume::bounded(0);

        (
            Self {
                period,
                service,
                command_rx,
            },
            command_tx,
        )
    }

    async fn run(self) {
        let period = if self.period == 0 { 3600 } else { self.period };
        let mut cycle_interval = time::interval(time::Duration::from_secs(period));

        loop {
            tokio::select! {
                Ok(cmd) = self.command_rx.recv_async() => {
                    info!("received command: {cmd}");
                    match cmd {
                        CycleCommand::Run(tx) => {
                            let res = self.service.run_cycle().await;
                            if tx.send(res).is_err() {
                                info!("failed to send cycle result");
                            }
                        }
                    }
                }
                start = cycle_interval.tick() => {
                    if self.period == 0 {
                        continue;
                    }

                    info!("start polling cycle");

                    match self.service.run_cycle().await {
                        Ok(summary) => info!(
                            "cycle done in {:?}: {} titles checked, {} failed, {} new events",
                            Instant::now() - start,
                            summary.titles_checked,
                            summary.titles_failed,
                            summary.new_events
                        ),
                        Err(e) => error!("cycle failed: {e}"),
                    }
                }
            }
        }
    }
}

pub fn start<B, T, F>(
    period: u64,
    service: TrackingService<B, T, F>,
) -> (CycleCommandSender, JoinHandle<()>)
where
    B: BookmarkRepository + Send + 'static,
    T: TrackingRepository + Send + 'static,
    F: FeedRepository + Send + 'static,
{
    let (worker, command_tx) = UpdatesWorker::new(period, service);

    let handle = tokio::spawn(worker.run());

    (command_tx, handle)
}
