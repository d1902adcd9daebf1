//! Demonstration of a tracker on a simulated page.
//!
//! This example shows how to:
//! 1. Build a page with a canned network
//! 2. Install a tracker with every interceptor enabled
//! 3. Bind a user identity
//! 4. Drive each category of page event once
//! 5. Inspect delivery statistics
//!
//! Run with: cargo run --example page_demo
//!
//! Records are logged by default. Set TRACKER_ENDPOINT to post them to a
//! real collection endpoint instead.

use std::sync::Arc;

use page_tracker::{
    logging,
    page::{Element, ErrorEvent, ErrorObject, Page, Response, RouteTable},
    Beacon, HttpBeacon, LogBeacon, Tracker, TrackerOptions, TRACKER_ATTRIBUTE,
};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    logging::init("info");

    println!("page-tracker demo v{}", page_tracker::VERSION);
    println!("=====================================");
    println!();

    let endpoint = std::env::var("TRACKER_ENDPOINT").ok();
    let beacon: Arc<dyn Beacon> = match &endpoint {
        Some(_) => Arc::new(HttpBeacon::new()?),
        None => Arc::new(LogBeacon),
    };

    let page = Page::builder()
        .url("https://shop.example/home")
        .responder(
            RouteTable::new()
                .route("/api/products", Response::ok("[]").latency(45))
                .route(
                    "/api/cart",
                    Response::with_status(503, "cart service unavailable").latency(300),
                ),
        )
        .build();

    let options = TrackerOptions::new(
        endpoint.unwrap_or_else(|| "https://collect.example/track".to_string()),
        "demo-shop",
    )
    .with_interceptors_csv("all");

    let tracker = Tracker::install(&page, options, beacon);
    tracker.bind_identity(|| Some("demo-user".into()));

    println!("Instance ID: {}", tracker.instance_id());
    println!(
        "Interceptors: {}",
        tracker
            .installed()
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    println!("Navigating...");
    page.history().push_state(json!({"page": 2}), "", Some("/catalog?page=2"))?;
    page.set_hash("#filters");

    println!("Clicking...");
    page.click(&Element::new("button").with_attribute(TRACKER_ATTRIBUTE, "add-to-cart"));
    page.click(&Element::new("span"));

    println!("Failing...");
    let thrown = ErrorObject::new("TypeError", "Cannot read properties of undefined");
    page.raise_script_error(ErrorEvent::from_error(&thrown, "https://shop.example/app.js", 88, 14));
    page.fail_resource(&Element::new("img").with_attribute("src", "/img/missing.png"));

    println!("Requesting...");
    for url in ["/api/products?sort=price", "/api/cart"] {
        let request = page.new_request();
        request.open("GET", url)?;
        request.send(None)?;
        println!("  {url} -> {}", request.status());
    }

    tracker.report_json(json!({"type": "checkout", "items": 3, "total": 59.9}));

    println!();
    println!("{}", tracker.summary());
    println!();
    println!("Demo complete!");
    Ok(())
}
