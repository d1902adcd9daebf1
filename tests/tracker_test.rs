//! End-to-end behaviour of an installed tracker.

use page_tracker::page::{Element, ErrorEvent, ErrorObject, Response, RouteTable};
use page_tracker::{
    Identity, InterceptorKind, MemoryBeacon, Page, Tracker, TrackerOptions, TRACKER_ATTRIBUTE,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

const ENDPOINT: &str = "https://collect.test/track";

fn shop_page() -> Page {
    Page::builder()
        .url("https://shop.test/home#a")
        .manual_clock(1_000)
        .responder(
            RouteTable::new()
                .route("/api/x", Response::ok("{\"ok\":true}").latency(80))
                .route(
                    "/api/broken",
                    Response::with_status(500, "Internal Server Error").latency(15),
                ),
        )
        .build()
}

fn install(page: &Page, options: TrackerOptions) -> (Arc<Tracker>, MemoryBeacon) {
    page_tracker::logging::init_test();
    let beacon = MemoryBeacon::new();
    let tracker = Tracker::install(page, options, Arc::new(beacon.clone()));
    (tracker, beacon)
}

/// Fire one event of every category.
fn exercise(page: &Page) {
    page.history().push_state(Value::Null, "", Some("/next")).unwrap();
    page.set_hash("#b");
    page.click(&Element::new("button").with_attribute(TRACKER_ATTRIBUTE, "buy"));
    let thrown = ErrorObject::new("Error", "boom");
    page.raise_script_error(ErrorEvent::from_error(&thrown, "app.js", 1, 2));
    let req = page.new_request();
    req.open("GET", "/api/x").unwrap();
    req.send(None).unwrap();
}

fn kinds(beacon: &MemoryBeacon) -> Vec<String> {
    beacon
        .forms()
        .iter()
        .filter_map(|f| f.get("type").map(String::from))
        .collect()
}

#[test]
fn test_only_enabled_interceptors_fire() {
    let page = shop_page();
    let (tracker, beacon) = install(
        &page,
        TrackerOptions::new(ENDPOINT, "shop").with_hash(true).with_ajax(true),
    );
    assert_eq!(
        tracker.installed(),
        &[InterceptorKind::Hash, InterceptorKind::Ajax]
    );

    exercise(&page);
    assert_eq!(kinds(&beacon), vec!["hashchange", "ajaxTracker"]);
}

#[test]
fn test_all_interceptors_fire() {
    let page = shop_page();
    let (_tracker, beacon) = install(
        &page,
        TrackerOptions::new(ENDPOINT, "shop").with_interceptors_csv("all"),
    );

    exercise(&page);
    assert_eq!(
        kinds(&beacon),
        vec![
            "history.pushState",
            "hashchange",
            "dom.click",
            "jsError",
            "ajaxTracker"
        ]
    );
    assert!(beacon.submissions().iter().all(|s| s.endpoint == ENDPOINT));
}

#[test]
fn test_invalid_options_activate_nothing() {
    for options in [
        TrackerOptions::new("", "shop"),
        TrackerOptions::new(ENDPOINT, ""),
        TrackerOptions::default(),
    ] {
        let page = shop_page();
        let (tracker, beacon) = install(&page, options.with_interceptors_csv("all"));

        exercise(&page);
        tracker.report_custom("custom", Map::new());
        assert!(!tracker.is_active());
        assert!(beacon.is_empty());
        assert_eq!(page.window().listener_count("error"), 0);
    }
}

#[test]
fn test_one_tracker_per_page() {
    let page = shop_page();
    let (first, beacon) = install(&page, TrackerOptions::new(ENDPOINT, "shop").with_dom(true));
    let (second, other_beacon) = install(
        &page,
        TrackerOptions::new("https://elsewhere.test/", "other").with_interceptors_csv("all"),
    );

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &page.tracker().unwrap()));

    exercise(&page);
    assert_eq!(kinds(&beacon), vec!["dom.click"]);
    assert!(other_beacon.is_empty());
    assert_eq!(page.document().listener_count("click"), 1);
}

#[test]
fn test_separate_pages_get_separate_trackers() {
    let a = shop_page();
    let b = shop_page();
    let (ta, _) = install(&a, TrackerOptions::new(ENDPOINT, "a"));
    let (tb, _) = install(&b, TrackerOptions::new(ENDPOINT, "b"));
    assert!(!Arc::ptr_eq(&ta, &tb));
    assert_ne!(ta.instance_id(), tb.instance_id());
}

#[test]
fn test_click_marker() {
    let page = shop_page();
    let (_tracker, beacon) = install(&page, TrackerOptions::new(ENDPOINT, "shop").with_dom(true));

    page.click(&Element::new("div").with_attribute("data-tracker", "foo"));
    page.click(&Element::new("div"));

    let forms = beacon.forms();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].get("targetKey"), Some("foo"));
}

#[test]
fn test_script_error_reported_once() {
    let page = shop_page();
    let (_tracker, beacon) = install(
        &page,
        TrackerOptions::new(ENDPOINT, "shop").with_js_error(true),
    );

    let thrown = ErrorObject::new("RangeError", "bad index");
    let event = ErrorEvent::from_error(&thrown, "https://shop.test/app.js", 40, 9);
    for _ in 0..3 {
        assert!(page.raise_script_error(event.clone()));
    }
    assert_eq!(kinds(&beacon), vec!["jsError"]);
}

#[test]
fn test_response_body_only_for_failures() {
    let page = shop_page();
    let (_tracker, beacon) = install(&page, TrackerOptions::new(ENDPOINT, "shop").with_ajax(true));

    for url in ["/api/x?foo=1&bar=2", "/api/broken"] {
        let req = page.new_request();
        req.open("GET", url).unwrap();
        req.send(None).unwrap();
    }

    let forms = beacon.forms();
    assert_eq!(forms[0].get("status"), Some("200"));
    assert_eq!(forms[0].get("responseText"), Some(""));
    assert_eq!(forms[0].get("requestUrl"), Some("/api/x"));
    assert_eq!(forms[0].get("timeStampCompute"), Some("80"));
    assert_eq!(forms[1].get("status"), Some("500"));
    assert_eq!(forms[1].get("responseText"), Some("Internal Server Error"));
}

#[test]
fn test_identity_binding() {
    let page = shop_page();
    let (tracker, beacon) = install(&page, TrackerOptions::new(ENDPOINT, "shop"));

    assert!(tracker.report_json(json!({"type": "custom", "a": 1})));
    tracker.bind_identity(|| Some(Identity::from("u1")));
    assert!(tracker.report_json(json!({"type": "custom", "a": 1})));

    let forms = beacon.forms();
    assert_eq!(forms[0].get("type"), Some("custom"));
    assert_eq!(forms[0].get("a"), Some("1"));
    assert_eq!(forms[0].get("userId"), None);
    assert_eq!(forms[1].get("userId"), Some("u1"));
}

#[test]
fn test_custom_report_keeps_collector_fields() {
    let page = shop_page();
    let (tracker, beacon) = install(&page, TrackerOptions::new(ENDPOINT, "shop"));

    assert!(tracker.report_json(json!({
        "type": "custom",
        "url": "https://elsewhere.test/",
        "time": 1,
        "project": "other",
        "userId": "someone"
    })));

    let form = beacon.last().unwrap();
    let count = |key: &str| form.iter().filter(|(k, _)| *k == key).count();
    assert_eq!(count("project"), 1);
    assert_eq!(count("url"), 1);
    assert_eq!(count("time"), 1);
    assert_eq!(form.get("project"), Some("shop"));
    assert_eq!(form.get("url"), Some("https://shop.test/home#a"));
    assert_ne!(form.get("time"), Some("1"));
    assert_eq!(form.get("userId"), None);
}

#[test]
fn test_identity_is_resolved_at_send_time() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let page = shop_page();
    let (tracker, beacon) = install(&page, TrackerOptions::new(ENDPOINT, "shop").with_hash(true));
    let logged_in = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&logged_in);
    tracker.bind_identity(move || flag.load(Ordering::SeqCst).then(|| Identity::from(99_i64)));

    page.set_hash("#one");
    logged_in.store(true, Ordering::SeqCst);
    page.set_hash("#two");

    let forms = beacon.forms();
    assert_eq!(forms[0].get("userId"), None);
    assert_eq!(forms[1].get("userId"), Some("99"));
}

#[test]
fn test_fragment_change_carries_previous_url() {
    let page = shop_page();
    let (_tracker, beacon) = install(&page, TrackerOptions::new(ENDPOINT, "shop").with_hash(true));

    page.set_hash("#b");

    let form = beacon.last().unwrap();
    assert_eq!(form.get("oldURL"), Some("https://shop.test/home#a"));
    assert_eq!(form.get("url"), Some("https://shop.test/home#b"));
}

#[test]
fn test_common_fields() {
    let page = Page::builder()
        .url("https://shop.test/")
        .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_1) Gecko/20100101 Firefox/121.0")
        .build();
    let (tracker, beacon) = install(&page, TrackerOptions::new(ENDPOINT, "shop"));

    let mut fields = Map::new();
    fields.insert("plan".into(), json!("pro"));
    tracker.report_custom("signup", fields);

    let form = beacon.last().unwrap();
    assert_eq!(form.get("project"), Some("shop"));
    assert_eq!(form.get("url"), Some("https://shop.test/"));
    assert_eq!(form.get("browser"), Some("Firefox"));
    assert_eq!(form.get("browserVersion"), Some("121.0"));
    assert_eq!(form.get("system"), Some("MacOS"));
    assert!(form.get("time").and_then(|t| t.parse::<i64>().ok()).is_some());
    assert_eq!(tracker.environment().map(|e| e.browser.as_str()), Some("Firefox"));
}
