//! Real-time driver for the playback clock.
//!
//! A tokio task ticks on a fixed interval, measures the wall-clock time since
//! the previous tick and applies exactly one `tick(dt)` to the shared store
//! per iteration. The store lock is never held across an await point, so a
//! cancelled ticker cannot leave a half-applied update behind. Surfaces may
//! block (mpv IPC does), so frames are presented on the blocking pool.

use crate::error::{PreviewError, Result};
use crate::surface::RenderSurface;
use cutline_core::{TimeUs, TimelineStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub type SharedStore = Arc<Mutex<TimelineStore>>;

/// Why a ticker task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerExit {
    /// `cancel()` was called or the handle was dropped.
    Cancelled,
    /// The clock stopped, either at the end of the timeline or by a pause.
    Finished,
    /// The store mutex was poisoned by a panicking writer.
    StoreUnavailable,
    /// The render surface panicked while presenting a frame.
    SurfaceLost,
}

pub struct TickerHandle {
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<TickerExit>,
}

impl TickerHandle {
    /// Stop future ticks. Safe to call more than once.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> Result<TickerExit> {
        let TickerHandle { cancel_tx, task } = self;
        let exit = task.await?;
        drop(cancel_tx);
        Ok(exit)
    }
}

/// Put the store into the playing state and start ticking it.
pub fn start_playback<S>(store: SharedStore, surface: S, period: Duration) -> Result<TickerHandle>
where
    S: RenderSurface + 'static,
{
    {
        let mut guard = store.lock().map_err(|_| PreviewError::StoreUnavailable)?;
        guard.play();
    }
    Ok(spawn_ticker(store, surface, period))
}

/// Spawn the tick loop. The task ends by itself once the clock is stopped.
pub fn spawn_ticker<S>(store: SharedStore, mut surface: S, period: Duration) -> TickerHandle
where
    S: RenderSurface + 'static,
{
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                biased;
                changed = cancel_rx.changed() => {
                    if changed.is_err() || *cancel_rx.borrow() {
                        tracing::debug!(ticks, "ticker cancelled");
                        return TickerExit::Cancelled;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            let now = Instant::now();
            let dt = TimeUs::from_duration(now - last);
            last = now;
            ticks += 1;

            let frame = match store.lock() {
                Ok(mut guard) => guard.tick(dt),
                Err(_) => {
                    tracing::error!("timeline store lock poisoned, stopping ticker");
                    return TickerExit::StoreUnavailable;
                }
            };

            let presented = tokio::task::spawn_blocking(move || {
                let result = surface.present(&frame);
                (surface, frame, result)
            })
            .await;
            let (returned, frame, result) = match presented {
                Ok(out) => out,
                Err(e) => {
                    tracing::error!(error = %e, "render surface panicked, stopping ticker");
                    return TickerExit::SurfaceLost;
                }
            };
            surface = returned;
            if let Err(e) = result {
                tracing::warn!(error = %e, cursor = %frame.cursor, "render surface failed");
            }

            if !frame.is_playing {
                tracing::debug!(ticks, cursor = %frame.cursor, "clock stopped, ticker finished");
                return TickerExit::Finished;
            }
        }
    });

    TickerHandle { cancel_tx, task }
}
