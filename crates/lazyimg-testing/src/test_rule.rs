use lazyimg_core::{LazyImages, LazyValue, OptionsPatch, Phase};

use crate::test_platform::{TestElement, TestPlatform};

/// Engine plus in-memory document, with helpers that read like a scroll
/// session: mount, scroll into view, let time pass, finish the download.
pub struct LazyTestRule {
    platform: TestPlatform,
    lazy: LazyImages<TestPlatform>,
}

impl LazyTestRule {
    pub fn new() -> Self {
        Self::with_options(OptionsPatch::new())
    }

    pub fn with_options(patch: OptionsPatch<TestElement>) -> Self {
        Self::on_platform(TestPlatform::new(), patch)
    }

    pub fn on_platform(platform: TestPlatform, patch: OptionsPatch<TestElement>) -> Self {
        let lazy = LazyImages::with_options(platform.clone(), patch);
        Self { platform, lazy }
    }

    pub fn lazy(&self) -> &LazyImages<TestPlatform> {
        &self.lazy
    }

    pub fn platform(&self) -> &TestPlatform {
        &self.platform
    }

    pub fn image(&self) -> TestElement {
        self.platform.image()
    }

    pub fn div(&self) -> TestElement {
        self.platform.div()
    }

    pub fn mount(&self, element: &TestElement, value: impl Into<LazyValue<TestElement>>) {
        self.lazy.mount(element, value);
        self.await_idle();
    }

    pub fn update(&self, element: &TestElement, value: impl Into<LazyValue<TestElement>>) {
        self.lazy.update(element, value);
        self.await_idle();
    }

    pub fn unmount(&self, element: &TestElement) {
        self.lazy.unmount(element);
        self.await_idle();
    }

    pub fn scroll_into_view(&self, element: &TestElement) {
        self.platform.set_intersecting(element, true);
    }

    pub fn scroll_out_of_view(&self, element: &TestElement) {
        self.platform.set_intersecting(element, false);
    }

    pub fn advance_time(&self, ms: u64) {
        self.platform.advance(ms);
    }

    pub fn finish_load(&self, element: &TestElement) -> bool {
        self.platform.finish_load(element)
    }

    pub fn fail_load(&self, element: &TestElement) -> bool {
        self.platform.fail_load(element)
    }

    /// Delivers queued initial observer entries until none remain.
    pub fn await_idle(&self) {
        let mut rounds = 0;
        while self.platform.flush_observers() > 0 {
            rounds += 1;
            if rounds > 100 {
                panic!("Observer deliveries failed to settle after 100 rounds");
            }
        }
    }

    pub fn assert_phase(&self, element: &TestElement, expected: Phase) {
        assert_eq!(
            element.phase(),
            Some(expected),
            "unexpected phase for {:?}",
            element
        );
    }

    pub fn assert_src(&self, element: &TestElement, expected: &str) {
        assert_eq!(
            element.src().as_deref(),
            Some(expected),
            "unexpected src for {:?}",
            element
        );
    }
}

impl Default for LazyTestRule {
    fn default() -> Self {
        Self::new()
    }
}
