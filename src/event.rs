use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

pub enum DojoEvent {
    Key(KeyEvent),
    /// No input within one tick; time to deliver due deadlines.
    Tick,
    Resize,
}

/// Terminal input pumped from a background thread.
pub struct EventHandler {
    rx: mpsc::Receiver<DojoEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            loop {
                let next = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        // Release and repeat events would double-feed the
                        // typing drill on terminals that report them.
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            DojoEvent::Key(key)
                        }
                        Ok(Event::Resize(_, _)) => DojoEvent::Resize,
                        _ => continue,
                    }
                } else {
                    DojoEvent::Tick
                };
                if tx.send(next).is_err() {
                    return;
                }
            }
        });

        Self { rx }
    }

    pub fn next(&self) -> anyhow::Result<DojoEvent> {
        Ok(self.rx.recv()?)
    }
}
