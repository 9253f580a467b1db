//! Engine configuration.

use std::fmt;

use crate::lifecycle::Lifecycle;
use crate::logger::LogLevel;

/// Transparent 1x1 GIF shown while the real source is pending.
pub const DEFAULT_LOADING: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// Transparent 1x1 GIF substituted when the real source fails.
pub const DEFAULT_ERROR: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// Options forwarded to every intersection watcher.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    /// CSS margin around the root, e.g. `"0px"` or `"200px 0px"`.
    pub root_margin: String,
    /// Visible ratio in `0.0..=1.0` at which a crossing is reported.
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: "0px".into(),
            threshold: 0.0,
        }
    }
}

impl ObserverOptions {
    pub fn new(root_margin: impl Into<String>, threshold: f64) -> Self {
        Self {
            root_margin: root_margin.into(),
            threshold,
        }
    }
}

/// Resolved, process-wide engine configuration.
///
/// Values are taken as given; nothing here is validated.
pub struct LazyOptions<E> {
    /// Placeholder source shown until the real image is applied.
    pub loading: String,
    /// Placeholder source substituted after a load failure.
    pub error: String,
    pub observer_options: ObserverOptions,
    /// Enables user-facing diagnostics.
    pub log: bool,
    /// Default hooks for elements whose binding carries none.
    pub lifecycle: Lifecycle<E>,
    /// Level used for user-facing diagnostics.
    pub log_level: LogLevel,
    /// Default delay in milliseconds before committing a load.
    pub delay: Option<u32>,
}

impl<E> Default for LazyOptions<E> {
    fn default() -> Self {
        Self {
            loading: DEFAULT_LOADING.into(),
            error: DEFAULT_ERROR.into(),
            observer_options: ObserverOptions::default(),
            log: true,
            lifecycle: Lifecycle::default(),
            log_level: LogLevel::Error,
            delay: None,
        }
    }
}

impl<E> Clone for LazyOptions<E> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading.clone(),
            error: self.error.clone(),
            observer_options: self.observer_options.clone(),
            log: self.log,
            lifecycle: self.lifecycle.clone(),
            log_level: self.log_level,
            delay: self.delay,
        }
    }
}

impl<E> fmt::Debug for LazyOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyOptions")
            .field("loading", &self.loading)
            .field("error", &self.error)
            .field("observer_options", &self.observer_options)
            .field("log", &self.log)
            .field("lifecycle", &self.lifecycle)
            .field("log_level", &self.log_level)
            .field("delay", &self.delay)
            .finish()
    }
}

impl<E> LazyOptions<E> {
    /// Shallow merge: every field present in `patch` wins.
    ///
    /// Lifecycle hooks merge one level deep, so a patch carrying only a
    /// `loaded` hook keeps the configured `loading` and `error` hooks.
    pub fn merge(&mut self, patch: OptionsPatch<E>) {
        let OptionsPatch {
            loading,
            error,
            observer_options,
            log,
            lifecycle,
            log_level,
            delay,
        } = patch;

        if let Some(loading) = loading {
            self.loading = loading;
        }
        if let Some(error) = error {
            self.error = error;
        }
        if let Some(observer_options) = observer_options {
            self.observer_options = observer_options;
        }
        if let Some(log) = log {
            self.log = log;
        }
        if let Some(lifecycle) = lifecycle {
            self.lifecycle.merge(lifecycle);
        }
        if let Some(log_level) = log_level {
            self.log_level = log_level;
        }
        if let Some(delay) = delay {
            self.delay = Some(delay);
        }
    }
}

/// Partial configuration applied with [`LazyOptions::merge`].
///
/// # Example
///
/// ```rust,ignore
/// let patch = OptionsPatch::new()
///     .loading("/img/spinner.svg")
///     .observer_options(ObserverOptions::new("200px", 0.1))
///     .delay(300);
/// ```
pub struct OptionsPatch<E> {
    pub loading: Option<String>,
    pub error: Option<String>,
    pub observer_options: Option<ObserverOptions>,
    pub log: Option<bool>,
    pub lifecycle: Option<Lifecycle<E>>,
    pub log_level: Option<LogLevel>,
    pub delay: Option<u32>,
}

impl<E> Default for OptionsPatch<E> {
    fn default() -> Self {
        Self {
            loading: None,
            error: None,
            observer_options: None,
            log: None,
            lifecycle: None,
            log_level: None,
            delay: None,
        }
    }
}

impl<E> OptionsPatch<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading(mut self, loading: impl Into<String>) -> Self {
        self.loading = Some(loading.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn observer_options(mut self, options: ObserverOptions) -> Self {
        self.observer_options = Some(options);
        self
    }

    pub fn log(mut self, enabled: bool) -> Self {
        self.log = Some(enabled);
        self
    }

    pub fn lifecycle(mut self, lifecycle: Lifecycle<E>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn delay(mut self, delay_ms: u32) -> Self {
        self.delay = Some(delay_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn defaults_match_documented_values() {
        let options = LazyOptions::<()>::default();
        assert_eq!(options.loading, DEFAULT_LOADING);
        assert_eq!(options.error, DEFAULT_ERROR);
        assert_eq!(options.observer_options.root_margin, "0px");
        assert_eq!(options.observer_options.threshold, 0.0);
        assert!(options.log);
        assert_eq!(options.log_level, LogLevel::Error);
        assert_eq!(options.delay, None);
        assert!(options.lifecycle.is_empty());
    }

    #[test]
    fn later_keys_win() {
        let mut options = LazyOptions::<()>::default();
        options.merge(OptionsPatch::new().loading("a.gif").delay(100));
        options.merge(OptionsPatch::new().loading("b.gif").log(false));

        assert_eq!(options.loading, "b.gif");
        assert_eq!(options.delay, Some(100));
        assert!(!options.log);
        assert_eq!(options.error, DEFAULT_ERROR);
    }

    #[test]
    fn observer_options_are_replaced_as_a_unit() {
        let mut options = LazyOptions::<()>::default();
        options.merge(OptionsPatch::new().observer_options(ObserverOptions::new("50px", 0.5)));
        assert_eq!(options.observer_options, ObserverOptions::new("50px", 0.5));
    }

    #[test]
    fn lifecycle_merges_one_level() {
        let loading_calls = Rc::new(Cell::new(0));
        let loaded_calls = Rc::new(Cell::new(0));

        let mut options = LazyOptions::<()>::default();
        let counter = loading_calls.clone();
        options.merge(
            OptionsPatch::new().lifecycle(Lifecycle::new().on_loading(move |_| {
                counter.set(counter.get() + 1)
            })),
        );
        let counter = loaded_calls.clone();
        options.merge(
            OptionsPatch::new().lifecycle(Lifecycle::new().on_loaded(move |_| {
                counter.set(counter.get() + 1)
            })),
        );

        let lifecycle = &options.lifecycle;
        lifecycle.loading.as_ref().expect("loading hook kept")(&());
        lifecycle.loaded.as_ref().expect("loaded hook added")(&());
        assert!(lifecycle.error.is_none());
        assert_eq!(loading_calls.get(), 1);
        assert_eq!(loaded_calls.get(), 1);
    }
}
