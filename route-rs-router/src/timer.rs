use crate::error::{Result, RouterError};
use crossbeam::channel::{bounded, tick, Sender};
use crossbeam::select;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// A named thread that runs a closure once per period until stopped
pub struct PeriodicTask {
    name: String,
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// The first run happens one `period` after spawning
    pub fn spawn<F>(name: &str, period: Duration, mut task: F) -> Result<PeriodicTask>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = bounded::<()>(0);
        let ticker = tick(period);
        let thread_name = String::from(name);
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => task(),
                    recv(stopped) -> _ => break,
                }
            })
            .map_err(|source| RouterError::Spawn {
                name: thread_name,
                source,
            })?;

        Ok(PeriodicTask {
            name: String::from(name),
            stop,
            handle,
        })
    }

    /// Stops the timer and waits for a run in progress to finish
    pub fn stop(self) {
        drop(self.stop);
        if self.handle.join().is_err() {
            debug!("{} timer panicked", self.name);
        }
    }
}
