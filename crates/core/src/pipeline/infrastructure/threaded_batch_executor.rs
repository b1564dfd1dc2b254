use std::path::{Path, PathBuf};

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Result of one input of a batch.
#[derive(Debug)]
pub struct BatchOutcome<T, E> {
    pub path: PathBuf,
    pub result: Result<T, E>,
}

/// Runs a per-file job over a fixed pool of worker threads.
///
/// Layout: `main [feed paths] → workers → main [collect]`
///
/// Paths are fed through a bounded channel; outcomes are returned in input
/// order regardless of which worker finished first.
pub struct ThreadedBatchExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedBatchExecutor {
    /// `workers` is clamped to at least one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn execute<T, E, F>(&self, inputs: &[PathBuf], job: F) -> Vec<BatchOutcome<T, E>>
    where
        T: Send,
        E: Send,
        F: Fn(&Path) -> Result<T, E> + Sync,
    {
        if inputs.is_empty() {
            return Vec::new();
        }
        let workers = self.workers.min(inputs.len());
        let (job_tx, job_rx) = crossbeam_channel::bounded::<(usize, &Path)>(self.channel_capacity);
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, Result<T, E>)>();

        let mut slots: Vec<Option<Result<T, E>>> = inputs.iter().map(|_| None).collect();
        std::thread::scope(|s| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                let job = &job;
                s.spawn(move || {
                    for (index, path) in job_rx {
                        if done_tx.send((index, job(path))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(done_tx);

            for (index, path) in inputs.iter().enumerate() {
                if job_tx.send((index, path.as_path())).is_err() {
                    break;
                }
            }
            drop(job_tx);

            for (index, result) in done_rx {
                slots[index] = Some(result);
            }
        });
        log::debug!("Batch of {} inputs finished on {} workers", inputs.len(), workers);

        inputs
            .iter()
            .zip(slots)
            .filter_map(|(path, slot)| {
                slot.map(|result| BatchOutcome {
                    path: path.clone(),
                    result,
                })
            })
            .collect()
    }
}

impl Default for ThreadedBatchExecutor {
    fn default() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }
}
