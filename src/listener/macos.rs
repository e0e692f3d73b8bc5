// Distributed notification observer for the Music player

use crate::event_loop::LoopMessage;
use crate::track::PlaybackEvent;
use block2::RcBlock;
use objc2_foundation::{
    NSDistributedNotificationCenter, NSJSONSerialization, NSJSONWritingOptions, NSNotification,
    NSRunLoop, NSString,
};
use std::ptr::NonNull;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

/// Notifications posted by the player on every state change.
/// Older systems still use the iTunes name.
pub const NOTIFICATION_NAMES: [&str; 2] = ["com.apple.Music.playerInfo", "com.apple.iTunes.playerInfo"];

/// Observes player notifications on a dedicated thread running its own run loop.
pub fn spawn_notification_listener(tx: Sender<LoopMessage>) -> JoinHandle<()> {
    thread::spawn(move || {
        let block = RcBlock::new(move |notification: NonNull<NSNotification>| {
            // SAFETY: the center hands us a live notification for the duration of the call
            let notification = unsafe { notification.as_ref() };
            log::debug!("Got a notification: {}", unsafe { notification.name() });

            if let Some(event) = decode(notification) {
                if tx.send(LoopMessage::Playback(event)).is_err() {
                    log::debug!("Event loop has gone away, dropping notification");
                }
            }
        });

        let center = unsafe { NSDistributedNotificationCenter::defaultCenter() };
        let observers: Vec<_> = NOTIFICATION_NAMES
            .iter()
            .map(|name| {
                let name = NSString::from_str(name);
                let observer = unsafe {
                    center.addObserverForName_object_queue_usingBlock(Some(&name), None, None, &block)
                };
                log::debug!("Added observer for {}", name);
                observer
            })
            .collect();

        unsafe { NSRunLoop::currentRunLoop().run() };

        drop(observers);
    })
}

/// Round-trips the user info dictionary through JSON so it can be decoded
/// without per-key Objective-C lookups.
fn decode(notification: &NSNotification) -> Option<PlaybackEvent> {
    let info = unsafe { notification.userInfo() }?;

    if !unsafe { NSJSONSerialization::isValidJSONObject(&info) } {
        log::warn!("Notification user info can't be represented as JSON, ignoring it");
        return None;
    }

    let data = match unsafe {
        NSJSONSerialization::dataWithJSONObject_options_error(&info, NSJSONWritingOptions(0))
    } {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Failed to serialise notification: {}", e.localizedDescription());
            return None;
        }
    };

    match serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(data.bytes()) {
        Ok(info) => Some(PlaybackEvent::from_user_info(&info)),
        Err(e) => {
            log::warn!("Failed to decode notification: {}", e);
            None
        }
    }
}
