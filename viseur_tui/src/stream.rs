use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info, warn};
use viseur::{Delta, Gamelog, Viseur};

/// What the reader thread found in the stream.
#[derive(Debug)]
pub enum StreamMessage {
    Delta(Delta),
    /// The stream ended, no more deltas will come.
    Finished,
    Failed(String),
}

/// A gamelog written as JSON lines while the game is played: the gamelog
/// without its later deltas first, then one delta per line.
pub struct DeltaStream {
    receiver: Receiver<StreamMessage>,
    handle: Option<JoinHandle<()>>,
}

impl DeltaStream {
    /// Reads the first line of the stream and hands the rest to a reader
    /// thread.
    pub fn open(path: &Path) -> anyhow::Result<(Gamelog, Self)> {
        let file = File::open(path)
            .with_context(|| format!("Could not open the stream {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(
        mut reader: impl BufRead + Send + 'static,
    ) -> anyhow::Result<(Gamelog, Self)> {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let mut gamelog: Gamelog = header
            .trim_end()
            .parse()
            .context("The first line of the stream is not a gamelog")?;
        gamelog.streaming = true;

        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            for line in reader.lines() {
                let message = match line {
                    Err(err) => StreamMessage::Failed(err.to_string()),
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => match serde_json::from_str::<Delta>(&line) {
                        Ok(delta) => StreamMessage::Delta(delta),
                        Err(err) => StreamMessage::Failed(err.to_string()),
                    },
                };
                let failed = matches!(message, StreamMessage::Failed(_));
                if sender.send(message).is_err() || failed {
                    return;
                }
            }
            debug!("Stream ended");
            // the receiver may already be gone
            sender.send(StreamMessage::Finished).ok();
        });

        Ok((
            gamelog,
            Self {
                receiver,
                handle: Some(handle),
            },
        ))
    }

    /// Everything that arrived since the last call, without waiting.
    pub fn try_iter(&self) -> impl Iterator<Item = StreamMessage> + '_ {
        self.receiver.try_iter()
    }

    /// Hands everything that arrived to the viewer. Returns whether the
    /// stream is over, either finished or broken off.
    pub fn pump(&mut self, viseur: &mut Viseur, now: Instant) -> bool {
        let messages: Vec<StreamMessage> = self.try_iter().collect();
        for message in messages {
            match message {
                StreamMessage::Delta(delta) => {
                    if let Err(err) = viseur.stream_delta(delta, now) {
                        viseur.abort_stream(&format!("{:#}", err));
                        return true;
                    }
                }
                StreamMessage::Finished => {
                    info!("Gamelog finished streaming");
                    viseur.finalize_gamelog();
                    self.join();
                    return true;
                }
                StreamMessage::Failed(err) => {
                    viseur.abort_stream(&err);
                    self.join();
                    return true;
                }
            }
        }
        false
    }

    /// Waits for the reader thread, once the stream has finished.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Stream reader panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;

    fn collect(stream: &DeltaStream) -> Vec<StreamMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = stream.receiver.recv_timeout(Duration::from_secs(5)) {
            let done = !matches!(message, StreamMessage::Delta(_));
            messages.push(message);
            if done {
                break;
            }
        }
        messages
    }

    #[test]
    fn header_then_deltas() {
        let input = concat!(
            r#"{ "gameName": "ConnectFour", "deltas": [{ "type": "start", "game": {} }] }"#,
            "\n",
            r#"{ "type": "finished", "game": { "repString": "7/7/7/7/7/7 y" } }"#,
            "\n\n",
            r#"{ "type": "over", "game": {} }"#,
            "\n",
        );
        let (gamelog, mut stream) = DeltaStream::from_reader(Cursor::new(input)).unwrap();
        assert!(gamelog.streaming);
        assert_eq!(gamelog.number_of_deltas(), 1);

        let messages = collect(&stream);
        assert_eq!(messages.len(), 3);
        assert!(matches!(&messages[0], StreamMessage::Delta(d) if d.is_finished()));
        assert!(matches!(messages[2], StreamMessage::Finished));
        stream.join();
    }

    #[test]
    fn bad_lines_stop_the_stream() {
        let input = concat!(
            r#"{ "gameName": "ConnectFour", "deltas": [{ "type": "start" }] }"#,
            "\n",
            "not json\n",
            r#"{ "type": "over" }"#,
            "\n",
        );
        let (_, stream) = DeltaStream::from_reader(Cursor::new(input)).unwrap();
        let messages = collect(&stream);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], StreamMessage::Failed(_)));
    }

    /// Pumps until the stream is over.
    fn pump_to_the_end(stream: &mut DeltaStream, viseur: &mut Viseur) {
        let now = Instant::now();
        for _ in 0..500 {
            if stream.pump(viseur, now) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("the stream never ended");
    }

    fn watching(input: &'static str) -> (Viseur, DeltaStream) {
        let (gamelog, stream) = DeltaStream::from_reader(Cursor::new(input)).unwrap();
        let mut viseur = Viseur::new(viseur::SettingsManager::default(), viseur::Config::default());
        viseur.load_gamelog(gamelog, Instant::now()).unwrap();
        (viseur, stream)
    }

    #[test]
    fn bad_lines_show_an_error_and_finalize() {
        let (mut viseur, mut stream) = watching(concat!(
            r#"{ "gameName": "ConnectFour", "deltas": [{ "type": "start", "game": { "repString": "7/7/7/7/7/7 r" } }] }"#,
            "\n",
            r#"{ "type": "finished", "game": { "repString": "3r3/7/7/7/7/7 y" } }"#,
            "\n",
            "not json\n",
        ));
        pump_to_the_end(&mut stream, &mut viseur);
        assert_eq!(viseur.history().map(|h| h.len()), Some(2));
        assert!(viseur.gui().modal().is_some_and(|m| m.is_error));
        assert!(viseur.gui().playback_pane.is_enabled());
        assert!(!viseur.gamelog().unwrap().streaming);
    }

    #[test]
    fn deltas_the_viewer_refuses_end_the_stream() {
        let (mut viseur, mut stream) = watching(concat!(
            r#"{ "gameName": "ConnectFour", "deltas": [{ "type": "start", "game": { "repString": "7/7/7/7/7/7 r" } }] }"#,
            "\n",
            r#"{ "type": "finished", "game": "not a state" }"#,
            "\n",
        ));
        pump_to_the_end(&mut stream, &mut viseur);
        assert_eq!(viseur.history().map(|h| h.len()), Some(1));
        assert!(viseur.gui().modal().is_some_and(|m| m.is_error));
        assert!(!viseur.gamelog().unwrap().streaming);
    }

    #[test]
    fn finished_streams_finalize() {
        let (mut viseur, mut stream) = watching(concat!(
            r#"{ "gameName": "ConnectFour", "deltas": [{ "type": "start", "game": { "repString": "7/7/7/7/7/7 r" } }] }"#,
            "\n",
            r#"{ "type": "finished", "game": { "repString": "3r3/7/7/7/7/7 y" } }"#,
            "\n",
        ));
        pump_to_the_end(&mut stream, &mut viseur);
        assert_eq!(viseur.history().map(|h| h.len()), Some(2));
        assert!(viseur.gui().modal().is_none());
        assert!(!viseur.gamelog().unwrap().streaming);
    }

    #[test]
    fn header_must_be_a_gamelog() {
        assert!(DeltaStream::from_reader(Cursor::new("[]\n")).is_err());
    }
}
