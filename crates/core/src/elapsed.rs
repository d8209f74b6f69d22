/// Seconds spent in an active session.
///
/// Advances only while running. Pausing keeps the count; stopping is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElapsedTracker {
    seconds: u64,
    running: bool,
    stopped: bool,
}

impl ElapsedTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes counting unless the tracker was stopped.
    pub fn run(&mut self) {
        if !self.stopped {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.stopped = true;
    }

    /// One second of wall-clock time passed. Returns the current count.
    pub fn tick(&mut self) -> u64 {
        if self.running {
            self.seconds = self.seconds.saturating_add(1);
        }
        self.seconds
    }

    #[must_use]
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
