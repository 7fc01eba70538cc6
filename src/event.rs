use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

pub enum AppEvent {
    Line(String),
    Tick,
    Eof,
}

/// Feeds input lines from a reader thread and synthesizes a `Tick` whenever
/// no line arrives within `tick_rate`.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn stdin(tick_rate: Duration) -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()), tick_rate)
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R, tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(AppEvent::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = tx.send(AppEvent::Eof);
        });

        Self { rx, tick_rate }
    }

    pub fn next(&self) -> AppEvent {
        match self.rx.recv_timeout(self.tick_rate) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => AppEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => AppEvent::Eof,
        }
    }
}
