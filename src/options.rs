use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Transform applied to an error's frame list before it is emitted.
pub type BacktraceCleaner = Arc<dyn Fn(&[String]) -> Vec<String> + Send + Sync>;

/// Options shared by the message, error and attribute formatters.
///
/// Passed by reference into every formatting call; the mapper owns one copy
/// and replaces it through its setters.
#[derive(Clone, Default)]
pub struct FormatterOptions {
    pub backtrace_cleaner: Option<BacktraceCleaner>,
    /// Maximum message length in characters.
    pub max_message_length: Option<NonZeroUsize>,
}

impl FormatterOptions {
    pub fn with_backtrace_cleaner<F>(mut self, cleaner: F) -> Self
    where
        F: Fn(&[String]) -> Vec<String> + Send + Sync + 'static,
    {
        self.backtrace_cleaner = Some(Arc::new(cleaner));
        self
    }

    pub fn with_max_message_length(mut self, length: NonZeroUsize) -> Self {
        self.max_message_length = Some(length);
        self
    }
}

impl fmt::Debug for FormatterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterOptions")
            .field("backtrace_cleaner", &self.backtrace_cleaner.as_ref().map(|_| "Fn(&[String])"))
            .field("max_message_length", &self.max_message_length)
            .finish()
    }
}
