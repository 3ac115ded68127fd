use std::fmt;

use log::LevelFilter;

/// How chatty a plugin invocation is on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    #[default]
    Normal,
    /// Set by `-D/--debug`.
    Debug,
}

impl Verbosity {
    fn level_filter(self) -> Option<LevelFilter> {
        match self {
            Self::Normal => None,
            Self::Debug => Some(LevelFilter::Debug),
        }
    }
}

/// Per-invocation state handed to the dispatcher, the plugin verbs and
/// [exec_with_options](super::exec::exec_with_options).
///
/// Created once after the command line has been parsed and never changed
/// afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    verbosity: Verbosity,
}

impl Context {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_debug(&self) -> bool {
        self.verbosity == Verbosity::Debug
    }

    /// Emits a debug record under `target`, but only in debug mode.
    pub fn debug(&self, target: &str, args: fmt::Arguments<'_>) {
        if self.is_debug() {
            log::debug!(target: target, "{args}");
        }
    }

    /// Installs the stderr logger for this process.
    ///
    /// `RUST_LOG` is honoured; debug mode raises the filter to `Debug`.
    /// A logger installed earlier (e.g. by another test) is left in place.
    pub fn init_logger(&self) {
        let mut env_logger = env_logger::builder();
        if let Some(level) = self.verbosity.level_filter() {
            env_logger.filter_level(level);
        }
        if env_logger.try_init().is_err() {
            log::trace!(target: "plugin::context", "Logger already initialised");
        }
    }
}
