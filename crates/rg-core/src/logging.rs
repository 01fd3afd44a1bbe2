//! Progress and failure messages for generation runs
//!
//! Messages go to the `log` facade under the `roomgraph` target, so any
//! logger the host installed sees them, and to an optional per-run callback
//! for callers that want the trail without configuring a global logger.

use std::fmt;

pub(crate) const TARGET: &str = "roomgraph";

type Callback = Box<dyn Fn(&str) + Send + Sync>;

/// Per-run log sink
#[derive(Default)]
pub struct GenerationLog {
    callback: Option<Callback>,
}

impl fmt::Debug for GenerationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationLog")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl GenerationLog {
    /// A log that only forwards to the `log` facade
    pub fn silent() -> Self {
        Self::default()
    }

    /// A log that also hands every message to `callback`
    pub fn with_callback<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    fn forward(&self, message: &str) {
        if let Some(callback) = &self.callback {
            callback(message);
        }
    }

    /// Fine-grained step trace; not forwarded to the callback
    pub fn debug(&self, message: impl AsRef<str>) {
        log::debug!(target: TARGET, "{}", message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::info!(target: TARGET, "{}", message);
        self.forward(message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::warn!(target: TARGET, "{}", message);
        self.forward(message);
    }
}
