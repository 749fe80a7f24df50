//! Poll loop controller: IDLE → AWAITING on submit, AWAITING → IDLE once a
//! result is accepted and handed to the host.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use webtrans_core::Result;

use crate::adapter::{SubmitOutcome, TranslationAdapter};
use crate::bridge::HostBridge;
use crate::location::PageLocationFacts;
use crate::page::Page;
use crate::request::TranslationRequest;
use crate::session::{AdapterSession, PollState, SupersededOutput};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);
pub const DEFAULT_SUPERSEDE_HOLD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Timer cadence of the poll loop.
    pub interval: Duration,
    /// How long a request may stay AWAITING. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// How long output left over from a superseded request is held back
    /// while it stays on screen unchanged.
    pub supersede_hold: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
            supersede_hold: DEFAULT_SUPERSEDE_HOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing pending; the tick was a no-op.
    Idle,
    /// Still waiting: no output, a placeholder, a duplicate or a page error.
    Pending,
    Delivered(String),
    /// The request timed out and was dropped.
    Expired(Option<TranslationRequest>),
}

/// One poll step over an explicit session. Never touches the host.
pub async fn poll_session(
    session: &mut AdapterSession,
    adapter: &dyn TranslationAdapter,
    page: &dyn Page,
    now: Instant,
) -> TickOutcome {
    if !session.is_awaiting() {
        return TickOutcome::Idle;
    }
    if session.is_expired(now) {
        return TickOutcome::Expired(session.cancel());
    }

    let extracted = {
        let ctx = session.placeholder_context();
        adapter.extract_result(page, &ctx).await
    };
    let candidate = match extracted {
        Ok(Some(candidate)) => candidate,
        Ok(None) => {
            session.observe(None, now);
            return TickOutcome::Pending;
        }
        Err(e) => {
            debug!(adapter = adapter.name(), error = %e, "output not readable yet");
            return TickOutcome::Pending;
        }
    };

    session.observe(Some(&candidate), now);
    if !session.accepts(&candidate) {
        return TickOutcome::Pending;
    }
    session.complete(&candidate);
    TickOutcome::Delivered(candidate)
}

/// Drives one adapter on one page load.
pub struct PollController {
    adapter: Arc<dyn TranslationAdapter>,
    page: Arc<dyn Page>,
    bridge: Arc<dyn HostBridge>,
    options: PollOptions,
    session: AdapterSession,
}

impl PollController {
    pub fn new(
        adapter: Arc<dyn TranslationAdapter>,
        page: Arc<dyn Page>,
        bridge: Arc<dyn HostBridge>,
        options: PollOptions,
        facts: &PageLocationFacts,
    ) -> Self {
        Self {
            adapter,
            page,
            bridge,
            options,
            session: AdapterSession::new(facts),
        }
    }

    pub fn session(&self) -> &AdapterSession {
        &self.session
    }

    pub fn state(&self) -> PollState {
        self.session.state()
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Host entry point. Always re-arms the wait, superseding any request
    /// still outstanding.
    pub async fn submit(&mut self, request: TranslationRequest) -> Result<SubmitOutcome> {
        info!(
            adapter = self.adapter.name(),
            source = %request.source(),
            target = %request.target(),
            chars = request.text().chars().count(),
            "submitting translation"
        );

        let now = Instant::now();
        let superseded = if self.session.supersedes(&request) {
            match self.adapter.read_output(self.page.as_ref()).await {
                Ok(output) => output.filter(|o| !o.is_empty()),
                Err(_) => None,
            }
        } else {
            None
        };
        let superseded = superseded.map(|text| {
            debug!(adapter = self.adapter.name(), previous = %text, "superseding pending request");
            SupersededOutput {
                text,
                hold_until: now + self.options.supersede_hold,
            }
        });

        let deadline = self.options.request_timeout.map(|t| now + t);
        self.session.begin(request.clone(), superseded, deadline);
        self.adapter.submit(self.page.as_ref(), &request).await
    }

    /// Drop the pending wait, if any.
    pub fn cancel(&mut self) -> Option<TranslationRequest> {
        let cancelled = self.session.cancel();
        if cancelled.is_some() {
            debug!(adapter = self.adapter.name(), "pending request cancelled");
        }
        cancelled
    }

    /// One timer tick. Delivers to the host at most once per accepted value.
    pub async fn tick(&mut self) -> TickOutcome {
        let outcome = poll_session(
            &mut self.session,
            self.adapter.as_ref(),
            self.page.as_ref(),
            Instant::now(),
        )
        .await;

        match &outcome {
            TickOutcome::Delivered(text) => {
                info!(
                    adapter = self.adapter.name(),
                    chars = text.chars().count(),
                    "translation ready"
                );
                self.bridge.set_translated(text);
            }
            TickOutcome::Expired(request) => {
                warn!(adapter = self.adapter.name(), "translation request timed out");
                self.bridge.request_expired(request.as_ref());
            }
            TickOutcome::Idle | TickOutcome::Pending => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{BingAdapter, GoogleAdapter};
    use crate::bridge::RecordingBridge;
    use crate::mock::MockPage;

    const BING_DE: &str = "https://www.bing.com/translator/?from=auto&to=de&text=x";
    const INPUT: &str = "textarea#tta_input_ta";
    const OUTPUT: &str = "#tta_output_ta";
    const GOOGLE_OUTPUT: &str = "span.translation > span, #result_box > span";

    fn controller(page: &MockPage, options: PollOptions) -> (PollController, Arc<RecordingBridge>) {
        let bridge = Arc::new(RecordingBridge::default());
        let facts = PageLocationFacts::parse(&page.current_location());
        let controller = PollController::new(
            Arc::new(BingAdapter::new()),
            Arc::new(page.clone()),
            bridge.clone(),
            options,
            &facts,
        );
        (controller, bridge)
    }

    fn results_page() -> MockPage {
        let page = MockPage::new(BING_DE);
        page.add_input(INPUT);
        page.set_value(OUTPUT, "");
        page
    }

    fn request(text: &str) -> TranslationRequest {
        TranslationRequest::new(text, "auto", "de").unwrap()
    }

    #[tokio::test]
    async fn test_idle_ticks_are_noops() {
        let page = MockPage::blank();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        page.set_value(OUTPUT, "Hallo");
        assert_eq!(ctl.tick().await, TickOutcome::Idle);
        assert!(bridge.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_delivers_once_when_output_is_stable() {
        let page = results_page();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("hello")).await.unwrap();

        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        page.set_value(OUTPUT, "Hallo");
        assert_eq!(ctl.tick().await, TickOutcome::Delivered("Hallo".into()));
        assert_eq!(ctl.tick().await, TickOutcome::Idle);
        assert_eq!(ctl.tick().await, TickOutcome::Idle);
        assert_eq!(bridge.delivered(), vec!["Hallo".to_string()]);
        assert_eq!(ctl.state(), PollState::Idle);
    }

    #[tokio::test]
    async fn test_placeholders_are_not_delivered() {
        let page = results_page();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("hello")).await.unwrap();

        for placeholder in ["...", "", "hello ..."] {
            page.set_value(OUTPUT, placeholder);
            assert_eq!(ctl.tick().await, TickOutcome::Pending);
        }
        assert!(bridge.delivered().is_empty());
        assert_eq!(ctl.state(), PollState::Awaiting);
    }

    #[tokio::test]
    async fn test_same_result_after_resubmit_is_suppressed() {
        let page = results_page();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("hello")).await.unwrap();
        page.set_value(OUTPUT, "Hallo");
        ctl.tick().await;

        ctl.submit(request("hello")).await.unwrap();
        page.set_value(OUTPUT, "Hallo ...");
        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        page.set_value(OUTPUT, "Hallo");
        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        page.set_value(OUTPUT, "Guten Tag");
        assert_eq!(ctl.tick().await, TickOutcome::Delivered("Guten Tag".into()));
        assert_eq!(bridge.delivered().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_output_is_held_back() {
        let page = results_page();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("one")).await.unwrap();
        // The first request's result renders, but B arrives before the tick.
        page.set_value(OUTPUT, "eins");
        ctl.submit(request("two")).await.unwrap();

        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        page.set_value(OUTPUT, "zwei");
        assert_eq!(ctl.tick().await, TickOutcome::Delivered("zwei".into()));
        assert_eq!(bridge.delivered(), vec!["zwei".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_result_after_supersession_is_delivered() {
        let page = results_page();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("hello")).await.unwrap();
        page.set_value(OUTPUT, "Hallo");
        ctl.submit(request("Hello")).await.unwrap();

        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        tokio::time::advance(DEFAULT_SUPERSEDE_HOLD).await;
        assert_eq!(ctl.tick().await, TickOutcome::Delivered("Hallo".into()));
        assert_eq!(bridge.delivered(), vec!["Hallo".to_string()]);
        assert_eq!(bridge.expired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_output_released_by_placeholder() {
        let page = results_page();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("hello")).await.unwrap();
        page.set_value(OUTPUT, "Hallo");
        ctl.submit(request("Hello")).await.unwrap();

        page.set_value(OUTPUT, "...");
        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        page.set_value(OUTPUT, "Hallo");
        assert_eq!(ctl.tick().await, TickOutcome::Delivered("Hallo".into()));
        assert_eq!(bridge.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_fragment_change_keeps_session() {
        let page = MockPage::new("https://translate.google.com/#view=home&op=translate&sl=auto&tl=fr&text=hello");
        page.add_input("textarea#source");
        page.set_texts(GOOGLE_OUTPUT, &["Bonjour"]);
        let bridge = Arc::new(RecordingBridge::default());
        let facts = PageLocationFacts::parse(&page.current_location());
        let mut ctl = PollController::new(
            Arc::new(GoogleAdapter::new()),
            Arc::new(page.clone()),
            bridge.clone(),
            PollOptions::default(),
            &facts,
        );
        let fr = TranslationRequest::new("hello", "auto", "fr").unwrap();
        ctl.submit(fr).await.unwrap();
        assert_eq!(ctl.tick().await, TickOutcome::Delivered("Bonjour".into()));

        let de = TranslationRequest::new("hello", "auto", "de").unwrap();
        let outcome = ctl.submit(de).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::SameDocument { .. }));
        assert_eq!(ctl.state(), PollState::Awaiting);
        assert_eq!(ctl.tick().await, TickOutcome::Pending);

        page.set_texts(GOOGLE_OUTPUT, &["Hallo"]);
        assert_eq!(ctl.tick().await, TickOutcome::Delivered("Hallo".into()));
        assert_eq!(bridge.delivered(), vec!["Bonjour".to_string(), "Hallo".to_string()]);
    }

    #[tokio::test]
    async fn test_page_errors_are_transient() {
        let page = results_page();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("hello")).await.unwrap();
        page.set_value(OUTPUT, "Hallo");
        page.fail_reads(true);
        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        page.fail_reads(false);
        assert_eq!(ctl.tick().await, TickOutcome::Delivered("Hallo".into()));
        assert_eq!(bridge.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_output_is_transient() {
        let page = results_page();
        page.remove(OUTPUT);
        let (mut ctl, _bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("hello")).await.unwrap();
        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        assert_eq!(ctl.state(), PollState::Awaiting);
    }

    #[tokio::test]
    async fn test_cancel() {
        let page = results_page();
        let (mut ctl, bridge) = controller(&page, PollOptions::default());
        ctl.submit(request("hello")).await.unwrap();
        assert_eq!(ctl.cancel(), Some(request("hello")));
        page.set_value(OUTPUT, "Hallo");
        assert_eq!(ctl.tick().await, TickOutcome::Idle);
        assert!(bridge.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout() {
        let page = results_page();
        let options = PollOptions {
            request_timeout: Some(Duration::from_secs(2)),
            ..PollOptions::default()
        };
        let (mut ctl, bridge) = controller(&page, options);
        ctl.submit(request("hello")).await.unwrap();

        assert_eq!(ctl.tick().await, TickOutcome::Pending);
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(ctl.tick().await, TickOutcome::Expired(Some(request("hello"))));
        assert_eq!(bridge.expired(), 1);

        page.set_value(OUTPUT, "Hallo");
        assert_eq!(ctl.tick().await, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn test_submit_navigates_from_blank_page() {
        let page = MockPage::blank();
        let (mut ctl, _bridge) = controller(&page, PollOptions::default());
        let outcome = ctl.submit(request("hello")).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Navigated { .. }));
        assert_eq!(ctl.state(), PollState::Awaiting);
    }
}
