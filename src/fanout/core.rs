use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use rayon::prelude::*;
use thiserror::Error;

use crate::crc::{Report, Source, checksum_path};

/// How the collector orders its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Print each report as soon as it arrives (completion order).
    #[default]
    Unordered,
    /// Hold reports until all are in, then print in command-line order.
    Ordered,
}

/// Settings for one run, built from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub order: Order,
    /// Upper bound on concurrently running workers; `None` spawns one
    /// thread per file.
    pub jobs: Option<NonZeroUsize>,
}

/// What the collector saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, report: &Report) {
        if report.is_ok() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Failures of the run itself. Per-file problems never show up here;
/// they are carried on the individual reports.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
    #[error("failed to start worker for {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("workers exited after {received} of {expected} reports")]
    MissingReports { received: usize, expected: usize },
    #[error("report index {index} is out of range or repeated (expected {expected} reports)")]
    UnexpectedIndex { index: usize, expected: usize },
}

/// Checksum every path concurrently and print one line per path to `out`.
///
/// Workers hand their reports to the collector over a rendezvous channel,
/// so a finished worker waits until its line has been taken. The collector
/// runs on the calling thread.
pub fn run<S, W>(
    source: &S,
    paths: &[PathBuf],
    config: &RunConfig,
    out: &mut W,
) -> Result<Summary, RunError>
where
    S: Source,
    W: Write,
{
    let pool = match config.jobs {
        Some(n) => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(n.get())
                .thread_name(|i| format!("crc32-worker-{i}"))
                .build()?,
        ),
        None => None,
    };

    tracing::debug!(
        files = paths.len(),
        order = ?config.order,
        jobs = config.jobs.map(NonZeroUsize::get),
        "dispatching workers"
    );

    let (tx, rx) = mpsc::sync_channel::<Report>(0);

    thread::scope(|s| -> Result<Summary, RunError> {
        match &pool {
            None => {
                for (index, path) in paths.iter().enumerate() {
                    let tx = tx.clone();
                    thread::Builder::new()
                        .name(format!("crc32-{index}"))
                        .spawn_scoped(s, move || {
                            send_report(&tx, checksum_path(source, index, path))
                        })
                        .map_err(|e| RunError::Spawn {
                            path: path.clone(),
                            source: e,
                        })?;
                }
                drop(tx);
            }
            Some(pool) => {
                s.spawn(move || {
                    pool.install(|| {
                        paths
                            .par_iter()
                            .enumerate()
                            .for_each_with(tx, |tx, (index, path)| {
                                send_report(tx, checksum_path(source, index, path))
                            });
                    });
                });
            }
        }
        collect(rx, paths.len(), config.order, out)
    })
}

/// Hand a finished report to the collector.
fn send_report(tx: &SyncSender<Report>, report: Report) {
    let index = report.index;
    if tx.send(report).is_err() {
        // Collector already gave up (output error); nothing left to do.
        tracing::debug!(index, "collector gone, report dropped");
    }
}

/// Receive exactly `expected` reports from `rx` and print them in `order`.
///
/// Unordered output is flushed after every line so progress is visible as
/// files complete. Ordered output is written once all reports are in; a
/// report whose index is out of range or already taken fails the run
/// rather than overwriting or losing a line.
pub fn collect<W: Write>(
    rx: Receiver<Report>,
    expected: usize,
    order: Order,
    out: &mut W,
) -> Result<Summary, RunError> {
    let mut summary = Summary::default();

    match order {
        Order::Unordered => {
            for report in rx.iter().take(expected) {
                summary.record(&report);
                report.write_line(out)?;
                out.flush()?;
            }
        }
        Order::Ordered => {
            let mut slots: Vec<Option<Report>> = (0..expected).map(|_| None).collect();
            for report in rx.iter().take(expected) {
                let index = report.index;
                let slot = match slots.get_mut(index) {
                    Some(slot) if slot.is_none() => slot,
                    _ => return Err(RunError::UnexpectedIndex { index, expected }),
                };
                summary.record(&report);
                *slot = Some(report);
            }
            for report in slots.iter().flatten() {
                report.write_line(out)?;
            }
            out.flush()?;
        }
    }

    if summary.total() < expected {
        return Err(RunError::MissingReports {
            received: summary.total(),
            expected,
        });
    }

    tracing::debug!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "all reports collected"
    );
    Ok(summary)
}
