use lazyimg_core::{
    ImageRequest, LazyBinding, OptionsPatch, Phase, BACKGROUND_IMAGE, DEFAULT_LOADING,
    SRCSET_ATTRIBUTE, SIZES_ATTRIBUTE,
};
use lazyimg_testing::{LazyTestRule, TestPlatform};

#[test]
fn mount_shows_loading_placeholder() {
    let rule = LazyTestRule::new();
    let img = rule.image();

    rule.mount(&img, "photo.jpg");

    rule.assert_phase(&img, Phase::Loading);
    rule.assert_src(&img, DEFAULT_LOADING);
    assert!(rule.lazy().is_observed(&img));
    assert_eq!(rule.platform().watchers_observing(&img), 1);
}

#[test]
fn mount_uses_configured_and_overridden_placeholders() {
    let rule = LazyTestRule::with_options(OptionsPatch::new().loading("spinner.svg"));
    let configured = rule.image();
    let overridden = rule.image();

    rule.mount(&configured, "a.jpg");
    rule.mount(&overridden, LazyBinding::new("b.jpg").loading("dots.svg"));

    rule.assert_src(&configured, "spinner.svg");
    rule.assert_src(&overridden, "dots.svg");
}

#[test]
fn real_source_waits_for_intersection() {
    let rule = LazyTestRule::new();
    let img = rule.image();

    rule.mount(&img, "photo.jpg");
    rule.advance_time(10_000);
    assert!(img.writes_of("src").iter().all(|src| src != "photo.jpg"));

    rule.scroll_into_view(&img);

    rule.assert_src(&img, "photo.jpg");
    assert_eq!(rule.platform().watchers_observing(&img), 0);
}

#[test]
fn srcset_and_sizes_are_applied_with_the_source() {
    let rule = LazyTestRule::new();
    let img = rule.image();

    rule.mount(
        &img,
        LazyBinding::new("small.jpg")
            .srcset("small.jpg 480w, large.jpg 1080w")
            .sizes("(max-width: 600px) 480px, 1080px"),
    );
    assert_eq!(img.attribute(SRCSET_ATTRIBUTE), None);

    rule.scroll_into_view(&img);

    assert_eq!(
        img.attribute(SRCSET_ATTRIBUTE).as_deref(),
        Some("small.jpg 480w, large.jpg 1080w")
    );
    assert_eq!(
        img.attribute(SIZES_ATTRIBUTE).as_deref(),
        Some("(max-width: 600px) 480px, 1080px")
    );
}

#[test]
fn element_already_visible_loads_on_first_observer_delivery() {
    let rule = LazyTestRule::new();
    let img = rule.image();
    rule.scroll_into_view(&img);

    rule.mount(&img, "visible.jpg");

    rule.assert_src(&img, "visible.jpg");
}

#[test]
fn missing_intersection_support_loads_eagerly() {
    let rule = LazyTestRule::on_platform(TestPlatform::without_intersection_support(), OptionsPatch::new());
    let img = rule.image();

    rule.mount(&img, "eager.jpg");

    rule.assert_src(&img, "eager.jpg");
    assert_eq!(img.writes_of("src"), vec![DEFAULT_LOADING.to_string(), "eager.jpg".to_string()]);
    assert!(!rule.lazy().is_observed(&img));
    assert_eq!(rule.platform().watchers_created(), 0);
    rule.assert_phase(&img, Phase::Loading);

    assert!(rule.finish_load(&img));
    rule.assert_phase(&img, Phase::Loaded);
}

#[test]
fn refused_watcher_falls_back_to_eager_load() {
    let platform = TestPlatform::new();
    platform.refuse_watchers(true);
    let rule = LazyTestRule::on_platform(platform, OptionsPatch::new());
    let img = rule.image();

    rule.mount(&img, "fallback-eager.jpg");

    rule.assert_src(&img, "fallback-eager.jpg");
    assert!(!rule.lazy().is_observed(&img));
}

#[test]
fn non_image_elements_get_a_background_image() {
    let rule = LazyTestRule::new();
    let hero = rule.div();

    rule.mount(&hero, "hero.jpg");
    rule.assert_phase(&hero, Phase::Loading);
    assert_eq!(hero.style(BACKGROUND_IMAGE), None);

    rule.scroll_into_view(&hero);

    assert_eq!(hero.style(BACKGROUND_IMAGE).as_deref(), Some("url('hero.jpg')"));
    assert!(!hero.has_load_listener());
    assert!(!hero.has_error_listener());
}

#[test]
fn force_load_bypasses_intersection() {
    let rule = LazyTestRule::new();
    let img = rule.image();
    rule.mount(&img, "lazy.jpg");

    rule.lazy()
        .force_load(&img, ImageRequest::new("now.jpg").srcset("now-2x.jpg 2x"));

    rule.assert_src(&img, "now.jpg");
    assert_eq!(img.attribute(SRCSET_ATTRIBUTE).as_deref(), Some("now-2x.jpg 2x"));
    assert!(rule.finish_load(&img));
    rule.assert_phase(&img, Phase::Loaded);
}

#[test]
fn force_load_without_error_placeholder_keeps_failed_source() {
    let rule = LazyTestRule::new();
    let img = rule.image();

    rule.lazy().force_load(&img, ImageRequest::new("missing.jpg"));
    assert!(rule.fail_load(&img));

    rule.assert_src(&img, "missing.jpg");
    rule.assert_phase(&img, Phase::Error);
}

#[test]
fn unchanged_source_is_not_rewritten() {
    let rule = LazyTestRule::new();
    let img = rule.image();

    rule.lazy().force_load(&img, ImageRequest::new("same.jpg"));
    rule.lazy().force_load(&img, ImageRequest::new("same.jpg"));

    assert_eq!(img.writes_of("src"), vec!["same.jpg".to_string()]);
}

#[test]
fn watcher_receives_configured_observer_options() {
    use lazyimg_core::{ObserverOptions, Platform};

    let platform = TestPlatform::new();
    let options = ObserverOptions::new("200px 0px", 0.25);
    let watcher = platform
        .create_watcher(&options, Box::new(|_: &[lazyimg_core::IntersectionEntry<_>]| {}))
        .expect("watcher");
    assert_eq!(watcher.options(), &options);

    let rule = LazyTestRule::on_platform(platform, OptionsPatch::new().observer_options(options.clone()));
    assert_eq!(rule.lazy().options().observer_options, options);
}
