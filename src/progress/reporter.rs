use super::ProgressSender;
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use std::any::Any;
use std::io::Write;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

pub const TICK_INTERVAL: Duration = Duration::from_millis(50);
pub const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("step worker panicked: {0}")]
    WorkerPanicked(String),
}

pub struct ProgressReporter<W: Write> {
    out: W,
    tick: Duration,
    frame: usize,
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tick: TICK_INTERVAL,
            frame: 0,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn run<T, F>(&mut self, message: &str, task: F) -> Result<T, ProgressError>
    where
        T: Send,
        F: FnOnce(ProgressSender) -> T + Send,
    {
        let (progress_tx, progress_rx) = mpsc::channel::<String>();
        let (result_tx, result_rx) = mpsc::channel::<T>();
        let mut current = message.to_string();

        thread::scope(|scope| {
            let handle = scope.spawn(move || {
                let outcome = task(ProgressSender::new(progress_tx));
                let _ = result_tx.send(outcome);
            });

            loop {
                match result_rx.try_recv() {
                    Ok(outcome) => {
                        let _ = handle.join();
                        self.clear_line();
                        return Ok(outcome);
                    }
                    Err(TryRecvError::Disconnected) => {
                        let reason = match handle.join() {
                            Ok(()) => "worker exited without a result".to_string(),
                            Err(payload) => panic_message(payload.as_ref()),
                        };
                        self.clear_line();
                        return Err(ProgressError::WorkerPanicked(reason));
                    }
                    Err(TryRecvError::Empty) => {}
                }

                while let Ok(update) = progress_rx.try_recv() {
                    current = update;
                }
                self.draw_frame(&current);
                thread::sleep(self.tick);
            }
        })
    }

    fn draw_frame(&mut self, message: &str) {
        let frame = SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()];
        self.frame = self.frame.wrapping_add(1);
        let _ = queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(format!("{frame} {message}..."))
        );
        let _ = self.out.flush();
    }

    fn clear_line(&mut self) {
        let _ = queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = self.out.flush();
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}
