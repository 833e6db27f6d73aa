//! Configuration options for the duolog storage engine.

/// Configuration options for opening an engine.
#[derive(Debug, Clone)]
pub struct Options {
    /// Create the data directory and log files if they don't exist.
    /// Default: true
    pub create_if_missing: bool,

    /// Capacity of each pipeline stage's request queue.
    /// Writers block once a stage's queue is full.
    /// Default: 1024
    pub queue_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            queue_capacity: 1024,
        }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the data directory if it doesn't exist.
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the capacity of each pipeline stage's request queue.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.queue_capacity == 0 {
            return Err(crate::Error::invalid_argument("queue_capacity must be > 0"));
        }
        Ok(())
    }
}
