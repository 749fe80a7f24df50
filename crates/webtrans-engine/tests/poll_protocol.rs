//! End-to-end behaviour of the page script against an in-memory page that
//! behaves like the Bing translator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use webtrans_engine::{
    init, BingAdapter, BridgeEvent, ChannelBridge, MockPage, Page, PageLocationFacts, PageScript,
    PollOptions, ScriptExit,
};

const INPUT: &str = "textarea#tta_input_ta";
const OUTPUT: &str = "#tta_output_ta";

fn translate_word(text: &str) -> String {
    match text {
        "hello" => "Bonjour".into(),
        "goodbye" => "Au revoir".into(),
        other => format!("[fr] {}", other),
    }
}

/// Renders a translation on load and whenever the input changes.
fn fake_bing() -> MockPage {
    MockPage::blank()
        .on_load(|dom, url| {
            let facts = PageLocationFacts::parse(url);
            if let Some(text) = facts.param("text") {
                dom.set_value(INPUT, text);
                dom.set_value(OUTPUT, &translate_word(text));
            }
        })
        .on_input(|dom, selector, text| {
            if selector == INPUT {
                dom.set_value(OUTPUT, &translate_word(text));
            }
        })
}

async fn start(page: &MockPage) -> (PageScript, UnboundedReceiver<BridgeEvent>) {
    let (bridge, events) = ChannelBridge::new();
    let page: Arc<dyn Page> = Arc::new(page.clone());
    let script = init(
        page,
        Arc::new(BingAdapter::new()),
        bridge,
        PollOptions::default(),
    )
    .await;
    (script, events)
}

fn drain(events: &mut UnboundedReceiver<BridgeEvent>) -> Vec<BridgeEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn blank_page_submission_navigates_then_host_resubmits() {
    let page = fake_bing();
    let (mut script, mut events) = start(&page).await;
    script.translate("hello", "auto", "fr").unwrap();

    let ScriptExit::Navigated { url } = script.exited().await else {
        panic!("expected navigation");
    };
    assert!(url.contains("to=fr"));
    assert!(url.contains("text=hello"));
    assert!(drain(&mut events).is_empty());

    // New page context: fresh script, same request re-issued by the host.
    let (script, mut events) = start(&page).await;
    script.translate("hello", "auto", "fr").unwrap();
    assert_eq!(
        events.recv().await,
        Some(BridgeEvent::Translated("Bonjour".into()))
    );
    assert_eq!(page.navigations().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn results_page_submission_updates_input_in_place() {
    let page = fake_bing();
    page.set_location("https://www.bing.com/translator/?from=auto&to=de&text=x");
    page.add_input(INPUT);
    page.set_value(OUTPUT, "");

    let (script, _events) = start(&page).await;
    script.translate("hello", "auto", "de").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(page.value(INPUT).as_deref(), Some("hello"));
    assert_eq!(page.input_events(), 1);
    assert!(page.navigations().is_empty());
    assert!(script.is_running());
}

#[tokio::test(start_paused = true)]
async fn stable_output_is_delivered_exactly_once() {
    let page = fake_bing();
    page.set_location("https://www.bing.com/translator/?from=auto&to=fr&text=x");
    page.add_input(INPUT);

    let (script, mut events) = start(&page).await;
    script.translate("hello", "auto", "fr").unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(
        drain(&mut events),
        vec![BridgeEvent::Translated("Bonjour".into())]
    );
}

#[tokio::test(start_paused = true)]
async fn loading_marker_is_never_delivered() {
    let page = MockPage::new("https://www.bing.com/translator/?from=auto&to=fr&text=x");
    page.add_input(INPUT);
    page.set_value(OUTPUT, "...");

    let (script, mut events) = start(&page).await;
    script.translate("hello", "auto", "fr").unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(drain(&mut events).is_empty());

    page.set_value(OUTPUT, "Bonjour");
    assert_eq!(
        events.recv().await,
        Some(BridgeEvent::Translated("Bonjour".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn back_to_back_submissions_deliver_only_the_last() {
    let page = fake_bing();
    page.set_location("https://www.bing.com/translator/?from=auto&to=fr&text=x");
    page.add_input(INPUT);

    let (script, mut events) = start(&page).await;
    script.translate("hello", "auto", "fr").unwrap();
    script.translate("goodbye", "auto", "fr").unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(
        drain(&mut events),
        vec![BridgeEvent::Translated("Au revoir".into())]
    );
}

#[tokio::test(start_paused = true)]
async fn request_timeout_is_reported_to_the_host() {
    let page = MockPage::new("https://www.bing.com/translator/?from=auto&to=fr&text=x");
    page.add_input(INPUT);
    page.set_value(OUTPUT, "...");

    let (bridge, mut events) = ChannelBridge::new();
    let options = PollOptions {
        request_timeout: Some(Duration::from_secs(2)),
        ..PollOptions::default()
    };
    let script = init(Arc::new(page.clone()), Arc::new(BingAdapter::new()), bridge, options).await;
    script.translate("hello", "auto", "fr").unwrap();

    let Some(BridgeEvent::Expired(Some(request))) = events.recv().await else {
        panic!("expected expiry");
    };
    assert_eq!(request.text(), "hello");
}

#[tokio::test(start_paused = true)]
async fn failed_navigation_ends_the_script() {
    let page = MockPage::blank();
    page.fail_navigation(true);

    let (mut script, _events) = start(&page).await;
    script.translate("hello", "auto", "fr").unwrap();
    assert!(matches!(
        script.exited().await,
        ScriptExit::SubmitFailed { .. }
    ));
    assert!(script.translate("again", "auto", "fr").is_err());
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling() {
    let page = MockPage::new("https://www.bing.com/translator/?from=auto&to=fr&text=x");
    let (script, _events) = start(&page).await;
    assert_eq!(script.shutdown().await, ScriptExit::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn invalid_requests_are_rejected_before_reaching_the_page() {
    let page = MockPage::blank();
    let (script, _events) = start(&page).await;
    assert!(script.translate("", "auto", "fr").is_err());
    assert!(script.translate("hello", "auto", "").is_err());
    assert!(page.navigations().is_empty());
}
