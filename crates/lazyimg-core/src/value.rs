//! Binding payloads and their normalized form.

use std::fmt;

use crate::lifecycle::Lifecycle;
use crate::options::{LazyOptions, DEFAULT_ERROR, DEFAULT_LOADING};
use crate::platform::ElementKind;

/// Value attached to an element by the framework glue.
pub enum LazyValue<E> {
    /// Bare source; everything else comes from configuration.
    Source(String),
    Binding(LazyBinding<E>),
}

impl<E> From<&str> for LazyValue<E> {
    fn from(src: &str) -> Self {
        LazyValue::Source(src.to_string())
    }
}

impl<E> From<String> for LazyValue<E> {
    fn from(src: String) -> Self {
        LazyValue::Source(src)
    }
}

impl<E> From<LazyBinding<E>> for LazyValue<E> {
    fn from(binding: LazyBinding<E>) -> Self {
        LazyValue::Binding(binding)
    }
}

impl<E> fmt::Debug for LazyValue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyValue::Source(src) => f.debug_tuple("Source").field(src).finish(),
            LazyValue::Binding(binding) => f.debug_tuple("Binding").field(binding).finish(),
        }
    }
}

/// Structured payload. Empty strings and a zero delay count as absent.
pub struct LazyBinding<E> {
    pub src: String,
    pub srcset: Option<String>,
    pub sizes: Option<String>,
    pub loading: Option<String>,
    pub error: Option<String>,
    pub lifecycle: Option<Lifecycle<E>>,
    pub delay: Option<u32>,
    /// Commit on the first crossing, ignoring any configured delay.
    pub immediate: bool,
}

impl<E> LazyBinding<E> {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            srcset: None,
            sizes: None,
            loading: None,
            error: None,
            lifecycle: None,
            delay: None,
            immediate: false,
        }
    }

    pub fn srcset(mut self, srcset: impl Into<String>) -> Self {
        self.srcset = Some(srcset.into());
        self
    }

    pub fn sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn loading(mut self, loading: impl Into<String>) -> Self {
        self.loading = Some(loading.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn lifecycle(mut self, lifecycle: Lifecycle<E>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    pub fn delay(mut self, delay_ms: u32) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    /// Overrides a configured delay. A zero `delay` falls back to the
    /// configured one instead.
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }
}

impl<E> fmt::Debug for LazyBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyBinding")
            .field("src", &self.src)
            .field("srcset", &self.srcset)
            .field("sizes", &self.sizes)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .field("lifecycle", &self.lifecycle)
            .field("delay", &self.delay)
            .field("immediate", &self.immediate)
            .finish()
    }
}

/// How a source is written to an element, fixed when the descriptor is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyTarget {
    /// `src`/`srcset`/`sizes` attributes with observable load events.
    Image,
    /// `background-image` style, no completion events.
    Background,
}

impl From<ElementKind> for ApplyTarget {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Image => ApplyTarget::Image,
            ElementKind::Other => ApplyTarget::Background,
        }
    }
}

/// Fully resolved load parameters for one mount or update.
pub struct LoadDescriptor<E> {
    pub target: ApplyTarget,
    pub src: String,
    pub srcset: Option<String>,
    pub sizes: Option<String>,
    /// Never empty.
    pub loading: String,
    /// Never empty.
    pub error: String,
    pub lifecycle: Lifecycle<E>,
    /// Strictly positive when present.
    pub delay: Option<u32>,
}

impl<E> LoadDescriptor<E> {
    /// Request handed to the applier once the load is committed.
    pub fn request(&self) -> ImageRequest<E> {
        ImageRequest {
            src: self.src.clone(),
            srcset: self.srcset.clone(),
            sizes: self.sizes.clone(),
            error: Some(self.error.clone()),
            lifecycle: self.lifecycle.clone(),
        }
    }
}

impl<E> fmt::Debug for LoadDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadDescriptor")
            .field("target", &self.target)
            .field("src", &self.src)
            .field("srcset", &self.srcset)
            .field("sizes", &self.sizes)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .field("lifecycle", &self.lifecycle)
            .field("delay", &self.delay)
            .finish()
    }
}

/// Sources to apply to an element right away.
pub struct ImageRequest<E> {
    pub src: String,
    pub srcset: Option<String>,
    pub sizes: Option<String>,
    /// Substituted on failure when set.
    pub error: Option<String>,
    pub lifecycle: Lifecycle<E>,
}

impl<E> ImageRequest<E> {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            srcset: None,
            sizes: None,
            error: None,
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn srcset(mut self, srcset: impl Into<String>) -> Self {
        self.srcset = Some(srcset.into());
        self
    }

    pub fn sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn lifecycle(mut self, lifecycle: Lifecycle<E>) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn placeholder(explicit: Option<String>, configured: &str, builtin: &str) -> String {
    non_empty(explicit)
        .or_else(|| (!configured.is_empty()).then(|| configured.to_string()))
        .unwrap_or_else(|| builtin.to_string())
}

/// Normalizes `value` against `options`.
pub fn format_value<E>(
    value: LazyValue<E>,
    options: &LazyOptions<E>,
    target: ApplyTarget,
) -> LoadDescriptor<E> {
    match value {
        LazyValue::Source(src) => LoadDescriptor {
            target,
            src,
            srcset: None,
            sizes: None,
            loading: placeholder(None, &options.loading, DEFAULT_LOADING),
            error: placeholder(None, &options.error, DEFAULT_ERROR),
            lifecycle: options.lifecycle.clone(),
            delay: options.delay.filter(|delay| *delay > 0),
        },
        LazyValue::Binding(binding) => LoadDescriptor {
            target,
            src: binding.src,
            srcset: binding.srcset,
            sizes: binding.sizes,
            loading: placeholder(binding.loading, &options.loading, DEFAULT_LOADING),
            error: placeholder(binding.error, &options.error, DEFAULT_ERROR),
            lifecycle: binding
                .lifecycle
                .unwrap_or_else(|| options.lifecycle.clone()),
            delay: if binding.immediate {
                None
            } else {
                binding
                    .delay
                    .filter(|delay| *delay > 0)
                    .or(options.delay)
                    .filter(|delay| *delay > 0)
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionsPatch;

    fn configured() -> LazyOptions<()> {
        let mut options = LazyOptions::default();
        options.merge(
            OptionsPatch::new()
                .loading("spinner.gif")
                .error("broken.gif")
                .delay(250)
                .lifecycle(Lifecycle::new().on_loaded(|_| {})),
        );
        options
    }

    #[test]
    fn bare_source_takes_every_default() {
        let descriptor = format_value(LazyValue::from("a.png"), &configured(), ApplyTarget::Image);
        assert_eq!(descriptor.src, "a.png");
        assert_eq!(descriptor.srcset, None);
        assert_eq!(descriptor.sizes, None);
        assert_eq!(descriptor.loading, "spinner.gif");
        assert_eq!(descriptor.error, "broken.gif");
        assert_eq!(descriptor.delay, Some(250));
        assert!(descriptor.lifecycle.loaded.is_some());
        assert_eq!(descriptor.target, ApplyTarget::Image);
    }

    #[test]
    fn binding_overrides_field_by_field() {
        let binding: LazyBinding<()> = LazyBinding::new("b.png")
            .srcset("b-2x.png 2x")
            .sizes("100vw")
            .loading("local-spinner.gif")
            .delay(10);
        let descriptor = format_value(binding.into(), &configured(), ApplyTarget::Background);

        assert_eq!(descriptor.src, "b.png");
        assert_eq!(descriptor.srcset.as_deref(), Some("b-2x.png 2x"));
        assert_eq!(descriptor.sizes.as_deref(), Some("100vw"));
        assert_eq!(descriptor.loading, "local-spinner.gif");
        assert_eq!(descriptor.error, "broken.gif");
        assert_eq!(descriptor.delay, Some(10));
        assert_eq!(descriptor.target, ApplyTarget::Background);
    }

    #[test]
    fn falsy_fields_fall_back_instead_of_merging() {
        let binding: LazyBinding<()> = LazyBinding::new("c.png").loading("").error("").delay(0);
        let descriptor = format_value(binding.into(), &configured(), ApplyTarget::Image);
        assert_eq!(descriptor.loading, "spinner.gif");
        assert_eq!(descriptor.error, "broken.gif");
        assert_eq!(descriptor.delay, Some(250));
    }

    #[test]
    fn explicit_lifecycle_replaces_configured_hooks() {
        let binding: LazyBinding<()> = LazyBinding::new("d.png").lifecycle(Lifecycle::new());
        let descriptor = format_value(binding.into(), &configured(), ApplyTarget::Image);
        assert!(descriptor.lifecycle.is_empty());
    }

    #[test]
    fn placeholders_never_resolve_empty() {
        let mut options = LazyOptions::<()>::default();
        options.merge(OptionsPatch::new().loading("").error(""));
        let descriptor = format_value(LazyValue::from("e.png"), &options, ApplyTarget::Image);
        assert_eq!(descriptor.loading, DEFAULT_LOADING);
        assert_eq!(descriptor.error, DEFAULT_ERROR);
    }

    #[test]
    fn zero_delay_means_no_delay() {
        let mut options = LazyOptions::<()>::default();
        options.merge(OptionsPatch::new().delay(0));
        let descriptor = format_value(LazyValue::from("f.png"), &options, ApplyTarget::Image);
        assert_eq!(descriptor.delay, None);
    }

    #[test]
    fn immediate_binding_ignores_configured_delay() {
        let binding: LazyBinding<()> = LazyBinding::new("g.png").delay(40).immediate();
        let descriptor = format_value(binding.into(), &configured(), ApplyTarget::Image);
        assert_eq!(descriptor.delay, None);
    }

    #[test]
    fn sources_pass_through_uninterpreted() {
        let descriptor = format_value(
            LazyValue::from("not a url at all"),
            &LazyOptions::<()>::default(),
            ApplyTarget::Image,
        );
        assert_eq!(descriptor.src, "not a url at all");
    }
}
