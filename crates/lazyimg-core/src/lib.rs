//! Lazy image loading engine.
//!
//! Defers fetching an image's real source until its element is near or in
//! the viewport, showing a placeholder until then.
//!
//! # Architecture
//!
//! - [`LazyImages`] - facade used by framework glue (`mount`, `update`,
//!   `unmount`, `force_load`, `configure`)
//! - [`format_value`] - turns a binding payload into a [`LoadDescriptor`]
//! - [`ObserverRegistry`] - one watcher per element, keyed by [`ElementId`]
//! - intersection state machine - commits a load on the first crossing, or
//!   after a delay that is cancelled if the element leaves the viewport
//! - applier - writes `src`/`srcset`/`sizes` or a background image and
//!   reports [`Phase::Loaded`] / [`Phase::Error`]
//! - [`Platform`] - the host seam; see `lazyimg-platform-web` for browsers
//!   and `lazyimg-testing` for a deterministic in-memory host
//!
//! # Example
//!
//! ```rust,ignore
//! let lazy = LazyImages::new(platform);
//! lazy.mount(&img, LazyBinding::new("/photos/large.jpg").delay(150));
//! ```

mod applier;
pub mod collections;
mod controller;
mod engine;
mod lifecycle;
mod logger;
mod options;
mod platform;
mod registry;
mod value;

pub use applier::{BACKGROUND_IMAGE, SIZES_ATTRIBUTE, SRCSET_ATTRIBUTE, SRC_ATTRIBUTE};
pub use engine::LazyImages;
pub use lifecycle::{Lifecycle, LifecycleHook, Phase, PHASE_ATTRIBUTE};
pub use logger::{LogLevel, ParseLogLevelError, LOG_TARGET};
pub use options::{LazyOptions, ObserverOptions, OptionsPatch, DEFAULT_ERROR, DEFAULT_LOADING};
pub use platform::{
    ElementCallback, ElementId, ElementKind, IntersectionCallback, IntersectionEntry,
    IntersectionWatcher, Platform, TimerCallback,
};
pub use registry::{LoadAttempts, ObserverRegistry, PendingDelay, PendingDelays};
pub use value::{
    format_value, ApplyTarget, ImageRequest, LazyBinding, LazyValue, LoadDescriptor,
};
