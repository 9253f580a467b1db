use lazyimg_core::{LazyBinding, LogLevel, OptionsPatch, LOG_TARGET};
use lazyimg_testing::{CapturedRecord, LazyTestRule, LogCapture, TestPlatform};
use log::Level;

fn reported(level: Level, message: &str) -> CapturedRecord {
    CapturedRecord {
        target: LOG_TARGET.to_string(),
        level,
        message: message.to_string(),
    }
}

#[test]
fn failed_load_names_every_source() {
    let capture = LogCapture::start();
    let rule = LazyTestRule::new();
    let img = rule.image();
    rule.mount(&img, LazyBinding::new("ok.png").srcset("ok2.png 2x").sizes("50vw"));
    rule.scroll_into_view(&img);

    rule.fail_load(&img);

    assert_eq!(
        capture.reported(LOG_TARGET),
        vec![reported(
            Level::Error,
            "Image failed to load! Failed src was: ok.png; srcset was: ok2.png 2x; sizes were: 50vw",
        )]
    );
}

#[test]
fn failed_load_without_srcset_leaves_blanks() {
    let capture = LogCapture::start();
    let rule = LazyTestRule::new();
    let img = rule.image();
    rule.mount(&img, "plain.png");
    rule.scroll_into_view(&img);

    rule.fail_load(&img);

    assert_eq!(
        capture.reported(LOG_TARGET),
        vec![reported(
            Level::Error,
            "Image failed to load! Failed src was: plain.png; srcset was: ; sizes were: ",
        )]
    );
}

#[test]
fn missing_intersection_support_is_reported_at_configured_level() {
    let capture = LogCapture::start();
    let rule = LazyTestRule::on_platform(
        TestPlatform::without_intersection_support(),
        OptionsPatch::new().log_level(LogLevel::Warn),
    );
    let img = rule.image();

    rule.mount(&img, "eager.png");

    rule.assert_src(&img, "eager.png");
    assert_eq!(
        capture.reported(LOG_TARGET),
        vec![reported(
            Level::Warn,
            "IntersectionObserver is not supported, loading eager.png eagerly",
        )]
    );
}

#[test]
fn refused_watcher_is_reported() {
    let capture = LogCapture::start();
    let platform = TestPlatform::new();
    platform.refuse_watchers(true);
    let rule = LazyTestRule::on_platform(platform, OptionsPatch::new());
    let img = rule.image();

    rule.mount(&img, "eager.png");

    rule.assert_src(&img, "eager.png");
    assert_eq!(
        capture.reported(LOG_TARGET),
        vec![reported(
            Level::Error,
            "could not create an intersection watcher, loading eager.png eagerly",
        )]
    );
}

#[test]
fn disabled_logging_reports_nothing() {
    let capture = LogCapture::start();
    let rule = LazyTestRule::on_platform(
        TestPlatform::without_intersection_support(),
        OptionsPatch::new().log(false),
    );
    let img = rule.image();
    rule.mount(&img, "eager.png");
    rule.assert_src(&img, "eager.png");
    assert!(rule.fail_load(&img));

    assert!(capture.reported(LOG_TARGET).is_empty());
}

#[test]
fn level_change_applies_to_later_diagnostics() {
    let capture = LogCapture::start();
    let rule = LazyTestRule::new();
    let img = rule.image();
    rule.mount(&img, "late.png");
    rule.scroll_into_view(&img);

    rule.lazy().configure(OptionsPatch::new().log_level(LogLevel::Info));
    rule.fail_load(&img);

    let reported = capture.reported(LOG_TARGET);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].level, Level::Info);
    assert!(reported[0].message.starts_with("Image failed to load!"));
}
