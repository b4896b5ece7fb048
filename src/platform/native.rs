//! Native (headless) platform pieces
//!
//! Stdin stands in for the speech recognizer: each line typed is forwarded
//! as one classification event. A fixed-rate pacer stands in for the
//! display refresh.

use std::io::BufRead;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::voice::{ClassificationEvent, VoiceSender};

/// Forward each non-empty line of `input` as a labeled event.
///
/// Runs on its own thread until the input ends or the game drops its inbox.
pub fn spawn_line_voice<I>(input: I, sender: VoiceSender) -> JoinHandle<()>
where
    I: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            let label = line.trim();
            if label.is_empty() {
                continue;
            }
            if !sender.send(ClassificationEvent::labeled(label)) {
                log::debug!("Voice line `{}` not delivered", label);
            }
        }
        log::debug!("Voice input closed");
    })
}

/// Sleeps between refreshes to hold a target rate
#[derive(Debug)]
pub struct RefreshPacer {
    period: Duration,
    started: Instant,
    next: Instant,
}

impl RefreshPacer {
    pub fn new(hz: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(hz.max(1)));
        let now = Instant::now();
        Self {
            period,
            started: now,
            next: now + period,
        }
    }

    /// Milliseconds since the pacer was created
    pub fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Block until the next refresh is due
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            // Fell behind; don't try to catch up
            self.next = now + self.period;
        }
    }
}
