//! Per-page-load polling state.

use serde::Serialize;
use tokio::time::Instant;

use crate::adapter::PlaceholderContext;
use crate::location::PageLocationFacts;
use crate::request::TranslationRequest;

/// Observable state of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    Idle,
    Awaiting,
}

/// Output still on screen from a request that was replaced before it was
/// delivered. Held back until the output changes or `hold_until` passes;
/// after that an equal value is taken as the new request's own result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupersededOutput {
    pub text: String,
    pub hold_until: Instant,
}

/// State owned by one page load. Created when the page script starts,
/// dropped on navigation; nothing carries over to the next page.
#[derive(Debug, Clone, Default)]
pub struct AdapterSession {
    last_delivered: String,
    awaiting: bool,
    pending: Option<TranslationRequest>,
    superseded: Option<SupersededOutput>,
    deadline: Option<Instant>,
}

impl AdapterSession {
    /// A non-blank page may already be rendering the request that caused
    /// the navigation, so polling starts immediately there.
    pub fn new(facts: &PageLocationFacts) -> Self {
        Self {
            awaiting: !facts.is_blank(),
            ..Self::default()
        }
    }

    pub fn state(&self) -> PollState {
        if self.awaiting {
            PollState::Awaiting
        } else {
            PollState::Idle
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn last_delivered(&self) -> &str {
        &self.last_delivered
    }

    pub fn pending(&self) -> Option<&TranslationRequest> {
        self.pending.as_ref()
    }

    /// True when `request` replaces a different request that is still
    /// waiting for its result.
    pub fn supersedes(&self, request: &TranslationRequest) -> bool {
        self.awaiting && self.pending.as_ref().is_some_and(|p| p != request)
    }

    /// Start waiting for `request`. Any earlier wait is dropped, not queued.
    /// `last_delivered` is kept for duplicate suppression.
    pub fn begin(
        &mut self,
        request: TranslationRequest,
        superseded: Option<SupersededOutput>,
        deadline: Option<Instant>,
    ) {
        self.awaiting = true;
        self.pending = Some(request);
        self.superseded = superseded;
        self.deadline = deadline;
    }

    /// Record what the output region shows now (`None` for nothing or a
    /// placeholder). Releases the superseded snapshot once the output has
    /// moved away from it or its hold has run out.
    pub fn observe(&mut self, shown: Option<&str>, now: Instant) {
        let release = self
            .superseded
            .as_ref()
            .is_some_and(|s| shown != Some(s.text.as_str()) || now >= s.hold_until);
        if release {
            self.superseded = None;
        }
    }

    pub fn placeholder_context(&self) -> PlaceholderContext<'_> {
        PlaceholderContext {
            source_text: self.pending.as_ref().map(|r| r.text()),
            last_delivered: &self.last_delivered,
        }
    }

    /// Whether `candidate` may be delivered: it must differ from the last
    /// delivered value and from a superseded output still on hold.
    pub fn accepts(&self, candidate: &str) -> bool {
        self.awaiting
            && candidate != self.last_delivered
            && self.superseded.as_ref().map(|s| s.text.as_str()) != Some(candidate)
    }

    /// Record a delivery and go idle.
    pub fn complete(&mut self, text: &str) -> Option<TranslationRequest> {
        self.last_delivered = text.to_string();
        self.go_idle()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.awaiting && self.deadline.is_some_and(|d| now >= d)
    }

    /// Abandon the current wait, returning the request that was pending.
    pub fn cancel(&mut self) -> Option<TranslationRequest> {
        self.go_idle()
    }

    fn go_idle(&mut self) -> Option<TranslationRequest> {
        self.awaiting = false;
        self.superseded = None;
        self.deadline = None;
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(text: &str) -> TranslationRequest {
        TranslationRequest::new(text, "auto", "fr").unwrap()
    }

    #[test]
    fn test_initial_state_follows_location() {
        assert_eq!(
            AdapterSession::new(&PageLocationFacts::blank()).state(),
            PollState::Idle
        );
        let facts = PageLocationFacts::parse("https://www.bing.com/translator/?to=fr");
        assert_eq!(AdapterSession::new(&facts).state(), PollState::Awaiting);
    }

    #[test]
    fn test_complete_records_last_delivered() {
        let mut session = AdapterSession::default();
        session.begin(request("hello"), None, None);
        assert!(session.accepts("Bonjour"));
        let done = session.complete("Bonjour");
        assert_eq!(done, Some(request("hello")));
        assert_eq!(session.state(), PollState::Idle);
        assert_eq!(session.last_delivered(), "Bonjour");

        session.begin(request("hello"), None, None);
        assert!(!session.accepts("Bonjour"));
    }

    #[test]
    fn test_idle_session_accepts_nothing() {
        let session = AdapterSession::default();
        assert!(!session.accepts("Bonjour"));
    }

    #[test]
    fn test_supersession() {
        let mut session = AdapterSession::default();
        session.begin(request("one"), None, None);
        assert!(session.supersedes(&request("two")));
        assert!(!session.supersedes(&request("one")));

        let now = Instant::now();
        let held = SupersededOutput {
            text: "Un".into(),
            hold_until: now + Duration::from_secs(1),
        };
        session.begin(request("two"), Some(held), None);
        session.observe(Some("Un"), now);
        assert!(!session.accepts("Un"));
        assert!(session.accepts("Deux"));
        assert_eq!(session.pending(), Some(&request("two")));
    }

    #[test]
    fn test_superseded_output_released_when_output_moves() {
        let now = Instant::now();
        let mut session = AdapterSession::default();
        let held = SupersededOutput {
            text: "Un".into(),
            hold_until: now + Duration::from_secs(60),
        };
        session.begin(request("two"), Some(held), None);
        session.observe(None, now);
        assert!(session.accepts("Un"));
    }

    #[test]
    fn test_superseded_output_released_after_hold() {
        let now = Instant::now();
        let mut session = AdapterSession::default();
        let held = SupersededOutput {
            text: "Un".into(),
            hold_until: now + Duration::from_secs(1),
        };
        session.begin(request("two"), Some(held), None);
        session.observe(Some("Un"), now + Duration::from_millis(500));
        assert!(!session.accepts("Un"));
        session.observe(Some("Un"), now + Duration::from_secs(1));
        assert!(session.accepts("Un"));
    }

    #[test]
    fn test_deadline() {
        let now = Instant::now();
        let mut session = AdapterSession::default();
        session.begin(request("hello"), None, Some(now + Duration::from_secs(5)));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::from_secs(5)));
        session.cancel();
        assert!(!session.is_expired(now + Duration::from_secs(60)));
    }
}
