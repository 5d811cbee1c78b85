use crate::config::Settings;
use crate::progress::ProgressSender;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct FanOut {
    limit: usize,
    progress: Option<(ProgressSender, String)>,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl FanOut {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            progress: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.fan_out_concurrency)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn report_progress(mut self, progress: &ProgressSender, noun: &str) -> Self {
        self.progress = Some((progress.clone(), noun.to_string()));
        self
    }

    pub fn run<I, T, E, F>(&self, items: &[I], worker: F) -> Result<Vec<T>, E>
    where
        I: Sync,
        T: Send,
        E: Send,
        F: Fn(&I) -> Result<T, E> + Sync,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let next = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);
        let (result_tx, result_rx) = mpsc::channel::<Result<T, E>>();

        thread::scope(|scope| {
            for _ in 0..self.limit.min(total) {
                let tx = result_tx.clone();
                let progress = self.progress.clone();
                let (next, completed, failed, worker) = (&next, &completed, &failed, &worker);
                scope.spawn(move || loop {
                    if failed.load(Ordering::Acquire) {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::AcqRel);
                    let Some(item) = items.get(index) else {
                        break;
                    };

                    let outcome = worker(item);
                    match &outcome {
                        Ok(_) => {
                            let done = completed.fetch_add(1, Ordering::AcqRel) + 1;
                            if let Some((sender, noun)) = &progress {
                                sender.send(format!("Fetched {done}/{total} {noun}"));
                            }
                        }
                        Err(_) => failed.store(true, Ordering::Release),
                    }
                    if tx.send(outcome).is_err() {
                        break;
                    }
                });
            }
            drop(result_tx);

            let mut results = Vec::with_capacity(total);
            for outcome in result_rx.iter() {
                results.push(outcome?);
            }
            Ok(results)
        })
    }
}

pub fn fan_out<I, T, E, F>(items: &[I], limit: usize, worker: F) -> Result<Vec<T>, E>
where
    I: Sync,
    T: Send,
    E: Send,
    F: Fn(&I) -> Result<T, E> + Sync,
{
    FanOut::new(limit).run(items, worker)
}
