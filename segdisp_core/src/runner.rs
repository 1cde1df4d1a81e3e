//! Host execution model: the refresh path and the acquisition path on two threads.
//!
//! The refresh thread stands in for the timer interrupt. It ticks the
//! scheduler, sleeps the returned hold and, every `cadence_cycles` completed
//! cycles, posts a trigger to the acquisition thread. The post is a
//! `try_send` on a bounded(1) channel, so the refresh thread never blocks and
//! a trigger that arrives while one is pending is dropped.
//!
//! Both threads are shut down and joined when the `RunningDisplay` is dropped.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel as xch;
use segdisp_traits::{Clock, Converter, DigitLines, SegmentBus};

use crate::acquisition::Acquisition;
use crate::builder::DisplayEngine;
use crate::digits::{DigitBuffer, SharedDigitBuffer};
use crate::error::{DisplayError, Result};
use crate::scheduler::{CadenceGate, RefreshScheduler};
use crate::status::{AcquisitionStatus, RefreshStats};
use crate::util::duration_us;

/// Acquisition events kept before the oldest is discarded.
const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct StatsCells {
    ticks: AtomicU64,
    cycles: AtomicU64,
    overruns: AtomicU64,
    max_lateness_us: AtomicU64,
}

impl StatsCells {
    fn snapshot(&self) -> RefreshStats {
        RefreshStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            max_lateness_us: self.max_lateness_us.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
pub struct RunningDisplay {
    buffer: SharedDigitBuffer,
    stats: Arc<StatsCells>,
    events: xch::Receiver<AcquisitionStatus>,
    failure: xch::Receiver<DisplayError>,
    refresh_alive: Arc<AtomicBool>,
    /// Shutdown flag for the refresh loop (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Dropping this wakes the acquisition thread.
    stop_tx: Option<xch::Sender<()>>,
    refresh: Option<JoinHandle<()>>,
    acquisition: Option<JoinHandle<()>>,
}

impl RunningDisplay {
    /// Prime the filter on the calling thread, then start both paths.
    ///
    /// Fails without spawning anything when priming fails.
    pub fn spawn<L, B, A, C>(engine: DisplayEngine<L, B, A, C>) -> Result<Self>
    where
        L: DigitLines + Send + 'static,
        B: SegmentBus + Send + 'static,
        A: Converter + Send + 'static,
        C: Clock + Send + 'static,
    {
        let DisplayEngine {
            scheduler,
            mut acquisition,
            cadence,
            clock,
            buffer,
            cfg,
        } = engine;

        let average = acquisition.prime().map_err(eyre::Report::new)?;
        tracing::info!(
            average,
            cycle_us = duration_us(cfg.refresh.cycle()),
            cadence_cycles = cfg.sampling.cadence_cycles,
            "display starting"
        );

        let (trigger_tx, trigger_rx) = xch::bounded::<()>(1);
        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let (event_tx, events) = xch::bounded(EVENT_CAPACITY);
        let (failure_tx, failure) = xch::bounded(1);
        let stats = Arc::new(StatsCells::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let refresh_alive = Arc::new(AtomicBool::new(true));

        let refresh = {
            let stats = stats.clone();
            let shutdown = shutdown.clone();
            let alive = refresh_alive.clone();
            std::thread::Builder::new()
                .name("segdisp-refresh".into())
                .spawn(move || {
                    refresh_loop(
                        scheduler, cadence, clock, &trigger_tx, &stats, &shutdown, &failure_tx,
                    );
                    alive.store(false, Ordering::Release);
                })?
        };

        let drain = events.clone();
        let spawned = std::thread::Builder::new()
            .name("segdisp-acquisition".into())
            .spawn(move || {
                acquisition_loop(&mut acquisition, &trigger_rx, &stop_rx, &event_tx, &drain);
            });
        let acquisition = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                shutdown.store(true, Ordering::Relaxed);
                let _ = refresh.join();
                return Err(e.into());
            }
        };

        Ok(Self {
            buffer,
            stats,
            events,
            failure,
            refresh_alive,
            shutdown,
            stop_tx: Some(stop_tx),
            refresh: Some(refresh),
            acquisition: Some(acquisition),
        })
    }

    /// Most recent acquisition outcome since the last call, if any.
    pub fn latest(&self) -> Option<AcquisitionStatus> {
        self.events.try_iter().last()
    }

    /// What the panel is showing now.
    pub fn shown(&self) -> DigitBuffer {
        self.buffer.snapshot()
    }

    pub fn stats(&self) -> RefreshStats {
        self.stats.snapshot()
    }

    /// False once the refresh thread has stopped on a line error.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_alive.load(Ordering::Acquire)
    }

    /// The line error that stopped the refresh thread, if any.
    pub fn take_failure(&self) -> Option<DisplayError> {
        self.failure.try_recv().ok()
    }

    /// Stop both threads and return the final statistics.
    pub fn stop(mut self) -> RefreshStats {
        self.shutdown_and_join();
        self.stats.snapshot()
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        drop(self.stop_tx.take());
        for handle in [self.refresh.take(), self.acquisition.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = handle.join() {
                tracing::warn!(?e, "display thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RunningDisplay {
    fn drop(&mut self) {
        self.shutdown_and_join();
        tracing::trace!("display threads joined");
    }
}

fn refresh_loop<L, B, C>(
    mut scheduler: RefreshScheduler<L, B>,
    mut cadence: CadenceGate,
    clock: C,
    trigger: &xch::Sender<()>,
    stats: &StatsCells,
    shutdown: &AtomicBool,
    failure: &xch::Sender<DisplayError>,
) where
    L: DigitLines,
    B: SegmentBus,
    C: Clock,
{
    let mut deadline = clock.now();
    while !shutdown.load(Ordering::Relaxed) {
        let t = match scheduler.tick() {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "refresh stopped on line error");
                if let Err(blank_err) = scheduler.blank() {
                    tracing::warn!(error = %blank_err, "could not blank panel");
                }
                let _ = failure.try_send(e);
                return;
            }
        };
        stats.ticks.fetch_add(1, Ordering::Relaxed);
        if t.cycle_completed {
            stats.cycles.fetch_add(1, Ordering::Relaxed);
            if cadence.on_cycle() {
                match trigger.try_send(()) {
                    Ok(()) | Err(xch::TrySendError::Full(())) => {}
                    Err(xch::TrySendError::Disconnected(())) => break,
                }
            }
        }

        deadline += t.hold;
        let now = clock.now();
        if now >= deadline {
            let late = duration_us(now - deadline);
            if late > 0 {
                stats.overruns.fetch_add(1, Ordering::Relaxed);
                stats.max_lateness_us.fetch_max(late, Ordering::Relaxed);
                tracing::trace!(late_us = late, position = t.position, "tick overrun");
            }
            // Resynchronise instead of bursting to catch up.
            deadline = now;
            continue;
        }
        clock.sleep(deadline - now);
        let woke = clock.now();
        if woke > deadline {
            stats
                .max_lateness_us
                .fetch_max(duration_us(woke - deadline), Ordering::Relaxed);
        }
    }
    if let Err(e) = scheduler.blank() {
        tracing::warn!(error = %e, "could not blank panel on shutdown");
    }
    tracing::debug!("refresh thread exiting");
}

fn acquisition_loop<A, C>(
    acquisition: &mut Acquisition<A, C>,
    trigger: &xch::Receiver<()>,
    stop: &xch::Receiver<()>,
    events: &xch::Sender<AcquisitionStatus>,
    drain: &xch::Receiver<AcquisitionStatus>,
) where
    A: Converter,
    C: Clock,
{
    loop {
        xch::select! {
            recv(trigger) -> msg => {
                if msg.is_err() {
                    break;
                }
                let status = acquisition.poll();
                // Latest wins: make room by discarding the oldest event.
                if let Err(xch::TrySendError::Full(status)) = events.try_send(status) {
                    let _ = drain.try_recv();
                    let _ = events.try_send(status);
                }
            }
            recv(stop) -> _ => break,
        }
    }
    tracing::debug!("acquisition thread exiting");
}
