//! Lazy image loading driven by viewport intersection.
//!
//! The engine lives in `lazyimg-core` and is re-exported here. Enable the
//! `web` feature for the browser platform and the JavaScript directive.
//!
//! ```rust,ignore
//! use lazyimg::prelude::*;
//!
//! let lazy = LazyImages::with_options(WebPlatform::new(), OptionsPatch::new().delay(150));
//! lazy.mount(&img, LazyBinding::new("/photos/1.jpg").error("/img/broken.png"));
//! ```

pub use lazyimg_core::*;

#[cfg(feature = "web")]
pub use lazyimg_platform_web as web;

#[cfg(feature = "web")]
pub use lazyimg_platform_web::{LazyDirective, WebPlatform};

pub mod prelude {
    pub use lazyimg_core::{
        ImageRequest, LazyBinding, LazyImages, LazyValue, Lifecycle, LogLevel, ObserverOptions,
        OptionsPatch, Phase, Platform,
    };

    #[cfg(feature = "web")]
    pub use lazyimg_platform_web::{LazyDirective, WebPlatform};
}
