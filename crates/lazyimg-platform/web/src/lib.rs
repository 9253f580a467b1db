//! Browser platform for `lazyimg`.
//!
//! [`WebPlatform`] drives the engine with `IntersectionObserver`,
//! `window.setTimeout` and image `onload`/`onerror` handlers.
//! [`LazyDirective`] exposes mount/update/unmount to JavaScript.

pub mod binding;
mod directive;
mod platform;

pub use directive::LazyDirective;
pub use platform::{WebPlatform, WebTimer, WebWatcher};
