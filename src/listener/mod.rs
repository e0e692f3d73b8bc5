// Notification listeners
// Decode player notifications into playback events and post them to the loop.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::{spawn_notification_listener, NOTIFICATION_NAMES};

use crate::event_loop::LoopMessage;
use crate::track::PlaybackEvent;
use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

/// Decodes one line of newline-delimited JSON user info.
pub fn parse_line(line: &str) -> Option<PlaybackEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(serde_json::Value::Object(info)) => Some(PlaybackEvent::from_user_info(&info)),
        Ok(other) => {
            log::warn!("Ignoring notification that is not a JSON object: {}", other);
            None
        }
        Err(e) => {
            log::warn!("Ignoring malformed notification: {}", e);
            None
        }
    }
}

/// Posts every event read from `reader` to the loop.
///
/// Returns when the input ends or the loop has gone away.
pub fn forward_lines<R: BufRead>(reader: R, tx: &Sender<LoopMessage>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to read notification input: {}", e);
                break;
            }
        };

        if let Some(event) = parse_line(&line) {
            if tx.send(LoopMessage::Playback(event)).is_err() {
                break;
            }
        }
    }
}

/// Forwards every event from `reader`, then asks the loop to stop.
pub fn replay<R: BufRead>(reader: R, tx: &Sender<LoopMessage>) {
    forward_lines(reader, tx);
    let _ = tx.send(LoopMessage::Shutdown);
}

/// Replays notifications from standard input, one JSON object per line.
///
/// The loop shuts down once standard input is closed.
pub fn spawn_stdin_listener(tx: Sender<LoopMessage>) -> JoinHandle<()> {
    thread::spawn(move || {
        log::info!("Reading player notifications from standard input");
        replay(io::stdin().lock(), &tx);
        log::debug!("Standard input closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::PlayerState;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn parses_json_object_lines() {
        let event = parse_line(r#"{"Player State": "Paused", "Name": "Halleluhwah"}"#).unwrap();
        assert_eq!(event.state, PlayerState::Paused);
        assert_eq!(event.metadata.unwrap().title.as_deref(), Some("Halleluhwah"));
    }

    #[test]
    fn skips_blank_and_invalid_lines() {
        assert!(parse_line("   ").is_none());
        assert!(parse_line("[1, 2]").is_none());
        assert!(parse_line("{not json").is_none());
    }

    #[test]
    fn forwards_each_event() {
        let input = Cursor::new(
            "{\"Player State\": \"Playing\", \"Artist\": \"Can\", \"Name\": \"Vitamin C\"}\n\
             garbage\n\
             {\"Player State\": \"Stopped\"}\n",
        );
        let (tx, rx) = mpsc::channel();
        forward_lines(input, &tx);
        drop(tx);

        let states: Vec<_> = rx
            .iter()
            .map(|message| match message {
                LoopMessage::Playback(event) => event.state,
                other => panic!("unexpected message {:?}", other),
            })
            .collect();
        assert_eq!(states, vec![PlayerState::Playing, PlayerState::Stopped]);
    }

    #[test]
    fn end_of_input_stops_the_loop() {
        let input = Cursor::new("{\"Player State\": \"Paused\"}\n");
        let (tx, rx) = mpsc::channel();
        replay(input, &tx);
        drop(tx);

        let messages: Vec<_> = rx.iter().collect();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], LoopMessage::Playback(_)));
        assert!(matches!(messages[1], LoopMessage::Shutdown));
    }
}
