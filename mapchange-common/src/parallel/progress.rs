/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 10/09/2026
Last Modified: 03/10/2026
License: MIT
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Receives `(percent, message)` updates from long-running operations.
/// `percent` lies in `0.0..=100.0` and is a best-effort estimate.
pub trait ProgressSink {
    fn progress(&self, percent: f64, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(f64, &str),
{
    fn progress(&self, percent: f64, message: &str) {
        self(percent, message)
    }
}

/// Discards all progress updates.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn progress(&self, _percent: f64, _message: &str) {}
}

/// Prints `"<message>: <n>%"` whenever the whole-number percentage changes.
/// Silent unless verbose.
pub struct ConsoleProgress {
    verbose: bool,
    last: Mutex<Option<(String, usize)>>,
}

impl ConsoleProgress {
    pub fn new(verbose: bool) -> ConsoleProgress {
        ConsoleProgress {
            verbose,
            last: Mutex::new(None),
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn progress(&self, percent: f64, message: &str) {
        if !self.verbose {
            return;
        }
        let progress = percent.clamp(0.0, 100.0) as usize;
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let changed = match last.as_ref() {
            Some((m, p)) => m != message || *p != progress,
            None => true,
        };
        if changed {
            println!("{}: {}%", message, progress);
            *last = Some((message.to_string(), progress));
        }
    }
}

/// Counts completed items for one run. Workers increment it under its lock;
/// the count never decreases.
pub struct ProgressCounter {
    count: Mutex<usize>,
    total: usize,
}

impl ProgressCounter {
    pub fn new(total: usize) -> ProgressCounter {
        ProgressCounter {
            count: Mutex::new(0),
            total,
        }
    }

    pub fn increment(&self) -> usize {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        *count += 1;
        *count
    }

    pub fn get(&self) -> usize {
        *self.count.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        100.0 * self.get() as f64 / self.total as f64
    }
}

/// Cooperative cancellation flag shared between a caller and a running job.
/// Cloning yields a handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
