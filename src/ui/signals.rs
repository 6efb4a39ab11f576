use crate::error::{FollowbackError, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const FORCED_EXIT_CODE: i32 = 130;

/// Ctrl+C handling for one-shot commands. The first interrupt clears the
/// running flag, the second exits immediately.
///
/// The handler only flips the flag. Cleanup of scratch directories happens
/// in the pipeline, which polls [`GracefulShutdown::running_flag`] between
/// stages and removes its scratch state before returning `Cancelled`. A
/// handler that exited on the first interrupt would leave it behind.
pub struct GracefulShutdown {
    running: Arc<AtomicBool>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let interrupts = Arc::new(AtomicUsize::new(0));

        let flag = running.clone();
        ctrlc::set_handler(move || {
            flag.store(false, Ordering::SeqCst);

            if interrupts.fetch_add(1, Ordering::SeqCst) == 0 {
                eprintln!("\nStopping after the current step (Ctrl+C again to force exit)");
            } else {
                eprintln!("\nForce exit, scratch files may remain in the uploads directory");
                std::process::exit(FORCED_EXIT_CODE);
            }
        })
        .map_err(|e| FollowbackError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(Self { running })
    }

    /// No handler is registered; tests drive the flag directly.
    pub fn new_for_test() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(FollowbackError::Cancelled)
        }
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}
