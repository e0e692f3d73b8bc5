// Single-threaded event loop
// Playback notifications and timer fires arrive on one channel and are handled
// one at a time, so the monitor needs no locking.

use crate::media_monitor::{MediaMonitor, TimerPayload};
use crate::player::MediaPlayerQuery;
use crate::scrobbler::TrackingService;
use crate::timer::{ThreadTimer, Timer, TimerFire};
use crate::track::PlaybackEvent;
use std::sync::mpsc::{Receiver, Sender};

/// Messages consumed by [`run`].
#[derive(Debug)]
pub enum LoopMessage {
    Playback(PlaybackEvent),
    TimerFired(TimerFire<TimerPayload>),
    Shutdown,
}

/// A timer whose fires are posted back to the loop.
pub fn loop_timer(tx: Sender<LoopMessage>) -> ThreadTimer<TimerPayload> {
    ThreadTimer::new(move |fire| {
        if tx.send(LoopMessage::TimerFired(fire)).is_err() {
            log::debug!("Event loop has gone away, dropping timer fire");
        }
    })
}

/// Dispatches messages to `monitor` until `Shutdown` arrives or every sender is dropped.
pub fn run<P, S, T>(monitor: &mut MediaMonitor<P, S, T>, rx: Receiver<LoopMessage>)
where
    P: MediaPlayerQuery,
    S: TrackingService,
    T: Timer<TimerPayload>,
{
    log::debug!("Going into event loop...");

    for message in rx {
        match message {
            LoopMessage::Playback(event) => monitor.on_event(event),
            LoopMessage::TimerFired(fire) => {
                if fire.handle.is_cancelled() {
                    log::debug!("Dropping fire of cancelled timer {}", fire.handle.id());
                    continue;
                }
                monitor.on_timer_fired(fire);
            }
            LoopMessage::Shutdown => break,
        }
    }

    log::debug!("exiting...");
}
