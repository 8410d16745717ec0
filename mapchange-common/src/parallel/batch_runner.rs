/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 10/09/2026
Last Modified: 15/10/2026
License: MIT
*/

use super::progress::{CancelToken, ProgressCounter, ProgressSink};
use crate::configs::Configs;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// `min(10, cpus + 4)`
pub fn default_max_workers() -> usize {
    (num_cpus::get() + 4).min(10)
}

/// The results of a batched run.
#[derive(Debug)]
pub struct BatchOutcome<R> {
    /// One result per processed item, in submission order.
    pub results: Vec<R>,
    /// Number of batches whose results came back.
    pub batches_completed: usize,
    pub num_batches: usize,
    /// True if the run stopped early because its token was cancelled.
    pub cancelled: bool,
}

/// Runs a per-item transform over contiguous batches of a slice on a bounded
/// pool of worker threads.
///
/// Workers take whole batches off a shared queue and apply the transform to
/// each item in turn. A completed batch is sent back to the calling thread,
/// which reports progress in completion order and finally reassembles the
/// results in submission order. The transform's own errors are not caught
/// here: callers choose `R` (typically a `Result`) to carry them.
#[derive(Clone, Debug)]
pub struct BatchRunner {
    batch_size: usize,
    max_workers: usize,
}

impl Default for BatchRunner {
    fn default() -> BatchRunner {
        BatchRunner::new(DEFAULT_BATCH_SIZE, default_max_workers())
    }
}

impl BatchRunner {
    pub fn new(batch_size: usize, max_workers: usize) -> BatchRunner {
        BatchRunner {
            batch_size: batch_size.max(1),
            max_workers: max_workers.max(1),
        }
    }

    /// Uses the `batch_size` and `max_procs` settings; non-positive values
    /// fall back to the defaults.
    pub fn from_configs(configs: &Configs) -> BatchRunner {
        let batch_size = if configs.batch_size > 0 {
            configs.batch_size
        } else {
            DEFAULT_BATCH_SIZE
        };
        let max_workers = if configs.max_procs > 0 {
            configs.max_procs as usize
        } else {
            default_max_workers()
        };
        BatchRunner::new(batch_size, max_workers)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn num_batches(&self, num_items: usize) -> usize {
        (num_items + self.batch_size - 1) / self.batch_size
    }

    /// Applies `transform(index, item)` to every item. The token is checked
    /// before each batch is taken from the queue; a batch that has started
    /// always runs to completion.
    pub fn run<T, R, F>(
        &self,
        items: &[T],
        transform: F,
        progress: &dyn ProgressSink,
        message: &str,
        cancel: &CancelToken,
    ) -> BatchOutcome<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync,
    {
        let num_items = items.len();
        let num_batches = self.num_batches(num_items);
        if num_batches == 0 {
            progress.progress(100.0, message);
            return BatchOutcome {
                results: vec![],
                batches_completed: 0,
                num_batches: 0,
                cancelled: false,
            };
        }

        let batch_size = self.batch_size;
        let num_workers = self.max_workers.min(num_batches);
        let batch_queue = Mutex::new(0..num_batches);
        let counter = ProgressCounter::new(num_items);
        let mut completed: Vec<Option<Vec<R>>> = (0..num_batches).map(|_| None).collect();
        let mut batches_completed = 0;

        thread::scope(|s| {
            let (tx, rx) = mpsc::channel::<(usize, Vec<R>)>();
            for _ in 0..num_workers {
                let tx = tx.clone();
                let batch_queue = &batch_queue;
                let counter = &counter;
                let transform = &transform;
                s.spawn(move || loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    // Get the next batch up for processing
                    let batch = match batch_queue.lock() {
                        Ok(mut queue) => queue.next(),
                        Err(_) => None,
                    };
                    let batch = match batch {
                        Some(b) => b,
                        None => break, // There are no more batches to process
                    };
                    let start = batch * batch_size;
                    let end = (start + batch_size).min(num_items);
                    let mut results = Vec::with_capacity(end - start);
                    for i in start..end {
                        results.push(transform(i, &items[i]));
                        counter.increment();
                    }
                    if tx.send((batch, results)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            for (batch, results) in rx {
                completed[batch] = Some(results);
                batches_completed += 1;
                progress.progress(counter.percent(), message);
            }
        });

        let cancelled = batches_completed < num_batches;
        if cancelled {
            log::warn!(
                "{}: cancelled after {} of {} batches",
                message,
                batches_completed,
                num_batches
            );
        }
        BatchOutcome {
            results: completed.into_iter().flatten().flatten().collect(),
            batches_completed,
            num_batches,
            cancelled,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parallel::NullProgress;
    use proptest::prelude::*;
    use std::cell::RefCell;

    #[test]
    fn splits_into_expected_batches() {
        let runner = BatchRunner::new(100, 4);
        let items: Vec<usize> = (0..250).collect();
        let reports = RefCell::new(vec![]);
        let sink = |p: f64, _m: &str| reports.borrow_mut().push(p);
        let outcome = runner.run(&items, |_, x| x * 2, &sink, "Doubling", &CancelToken::new());
        assert_eq!(outcome.num_batches, 3);
        assert_eq!(outcome.batches_completed, 3);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.results.len(), 250);
        assert_eq!(outcome.results, items.iter().map(|x| x * 2).collect::<Vec<usize>>());
        let reports = reports.into_inner();
        assert_eq!(reports.len(), 3);
        assert_eq!(*reports.last().unwrap(), 100.0);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_input_reports_completion() {
        let runner = BatchRunner::default();
        let items: Vec<u8> = vec![];
        let reports = RefCell::new(vec![]);
        let sink = |p: f64, _m: &str| reports.borrow_mut().push(p);
        let outcome = runner.run(&items, |_, x| *x, &sink, "Nothing", &CancelToken::new());
        assert!(outcome.results.is_empty());
        assert_eq!(reports.into_inner(), vec![100.0]);
    }

    #[test]
    fn cancelled_token_stops_dispatch() {
        let runner = BatchRunner::new(10, 2);
        let items: Vec<u32> = (0..100).collect();
        let token = CancelToken::new();
        token.cancel();
        let outcome = runner.run(&items, |_, x| *x, &NullProgress, "Cancelled", &token);
        assert!(outcome.cancelled);
        assert_eq!(outcome.batches_completed, 0);
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn cancelling_mid_run_keeps_finished_batches_whole() {
        let runner = BatchRunner::new(5, 1);
        let items: Vec<u32> = (0..50).collect();
        let token = CancelToken::new();
        let outcome = runner.run(
            &items,
            |i, x| {
                if i == 7 {
                    token.cancel();
                }
                *x
            },
            &NullProgress,
            "Partial",
            &token,
        );
        assert!(outcome.cancelled);
        assert_eq!(outcome.batches_completed, 2);
        assert_eq!(outcome.results, (0..10).collect::<Vec<u32>>());
    }

    #[test]
    fn settings_override_defaults() {
        let mut configs = Configs::default();
        configs.max_procs = 3;
        configs.batch_size = 20;
        let runner = BatchRunner::from_configs(&configs);
        assert_eq!(runner.max_workers(), 3);
        assert_eq!(runner.batch_size(), 20);
        configs.max_procs = -1;
        assert_eq!(BatchRunner::from_configs(&configs).max_workers(), default_max_workers());
        assert!(default_max_workers() <= 10);
    }

    proptest! {
        #[test]
        fn results_match_sequential_transform(
            items in prop::collection::vec(-1000i64..1000, 0..400),
            batch_size in 1usize..64,
            workers in 1usize..8,
        ) {
            let runner = BatchRunner::new(batch_size, workers);
            let f = |_: usize, x: &i64| x * x - 3;
            let outcome = runner.run(&items, f, &NullProgress, "Squares", &CancelToken::new());
            let mut parallel = outcome.results.clone();
            let mut sequential: Vec<i64> = items.iter().enumerate().map(|(i, x)| f(i, x)).collect();
            parallel.sort();
            sequential.sort();
            prop_assert_eq!(parallel, sequential);
        }
    }
}
