use std::cell::RefCell;
use std::rc::Rc;

use lazyimg_core::{LazyBinding, Lifecycle, OptionsPatch, Phase, DEFAULT_ERROR};
use lazyimg_testing::{LazyTestRule, TestElement};

fn recording_lifecycle(log: &Rc<RefCell<Vec<&'static str>>>) -> Lifecycle<TestElement> {
    let loading = log.clone();
    let loaded = log.clone();
    let error = log.clone();
    Lifecycle::new()
        .on_loading(move |_: &TestElement| loading.borrow_mut().push("loading"))
        .on_loaded(move |_: &TestElement| loaded.borrow_mut().push("loaded"))
        .on_error(move |_: &TestElement| error.borrow_mut().push("error"))
}

#[test]
fn successful_load_marks_loaded_and_runs_hooks() {
    let rule = LazyTestRule::new();
    let img = rule.image();
    let log = Rc::new(RefCell::new(Vec::new()));

    rule.mount(&img, LazyBinding::new("ok.png").lifecycle(recording_lifecycle(&log)));
    rule.scroll_into_view(&img);
    assert!(rule.finish_load(&img));

    rule.assert_phase(&img, Phase::Loaded);
    assert_eq!(*log.borrow(), vec!["loading", "loaded"]);
    assert!(!img.has_load_listener());
}

#[test]
fn load_listener_fires_once() {
    let rule = LazyTestRule::new();
    let img = rule.image();
    let log = Rc::new(RefCell::new(Vec::new()));
    rule.mount(&img, LazyBinding::new("ok.png").lifecycle(recording_lifecycle(&log)));
    rule.scroll_into_view(&img);

    assert!(rule.finish_load(&img));
    assert!(!rule.finish_load(&img));

    assert_eq!(*log.borrow(), vec!["loading", "loaded"]);
}

#[test]
fn failed_load_substitutes_error_placeholder() {
    let rule = LazyTestRule::new();
    let img = rule.image();
    let log = Rc::new(RefCell::new(Vec::new()));

    rule.mount(
        &img,
        LazyBinding::new("ok.png")
            .error("fallback.png")
            .lifecycle(recording_lifecycle(&log)),
    );
    rule.scroll_into_view(&img);
    assert!(rule.fail_load(&img));

    rule.assert_src(&img, "fallback.png");
    rule.assert_phase(&img, Phase::Error);
    assert_eq!(*log.borrow(), vec!["loading", "error"]);
    assert!(!img.has_load_listener());
}

#[test]
fn failure_stops_further_automatic_loads() {
    let rule = LazyTestRule::new();
    let img = rule.image();
    rule.mount(&img, LazyBinding::new("ok.png").error("fallback.png"));
    rule.scroll_into_view(&img);
    rule.fail_load(&img);

    rule.scroll_out_of_view(&img);
    rule.scroll_into_view(&img);
    rule.advance_time(10_000);

    assert_eq!(
        img.writes_of("src"),
        vec![
            lazyimg_core::DEFAULT_LOADING.to_string(),
            "ok.png".to_string(),
            "fallback.png".to_string(),
        ]
    );
    assert_eq!(rule.platform().watchers_observing(&img), 0);
}

#[test]
fn failing_error_placeholder_is_not_rewritten() {
    let rule = LazyTestRule::new();
    let img = rule.image();
    rule.mount(&img, LazyBinding::new("ok.png").error("fallback.png"));
    rule.scroll_into_view(&img);

    rule.fail_load(&img);
    rule.fail_load(&img);

    let fallbacks = img
        .writes_of("src")
        .into_iter()
        .filter(|src| src == "fallback.png")
        .count();
    assert_eq!(fallbacks, 1);
}

#[test]
fn configured_error_placeholder_is_the_default() {
    let rule = LazyTestRule::with_options(OptionsPatch::new().error("broken.svg"));
    let img = rule.image();
    rule.mount(&img, "ok.png");
    rule.scroll_into_view(&img);
    rule.fail_load(&img);

    rule.assert_src(&img, "broken.svg");
}

#[test]
fn builtin_error_placeholder_backs_empty_configuration() {
    let rule = LazyTestRule::with_options(OptionsPatch::new().error(""));
    let img = rule.image();
    rule.mount(&img, "ok.png");
    rule.scroll_into_view(&img);
    rule.fail_load(&img);

    rule.assert_src(&img, DEFAULT_ERROR);
}

#[test]
fn background_targets_never_complete() {
    let rule = LazyTestRule::new();
    let tile = rule.div();
    rule.mount(&tile, "tile.png");
    rule.scroll_into_view(&tile);

    assert!(!rule.finish_load(&tile));
    assert!(!rule.fail_load(&tile));
    rule.assert_phase(&tile, Phase::Loading);
}

#[test]
fn configured_hooks_apply_to_bare_sources() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let rule = LazyTestRule::with_options(OptionsPatch::new().lifecycle(recording_lifecycle(&log)));
    let img = rule.image();

    rule.mount(&img, "ok.png");
    rule.scroll_into_view(&img);
    rule.finish_load(&img);

    assert_eq!(*log.borrow(), vec!["loading", "loaded"]);
}

#[test]
fn hooks_receive_the_element() {
    let rule = LazyTestRule::new();
    let img = rule.image();
    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();

    rule.mount(
        &img,
        LazyBinding::new("ok.png")
            .lifecycle(Lifecycle::new().on_loaded(move |element: &TestElement| {
                *sink.borrow_mut() = Some(element.clone());
            })),
    );
    rule.scroll_into_view(&img);
    rule.finish_load(&img);

    assert_eq!(seen.borrow().as_ref(), Some(&img));
}
