//! Machine translation through provider web pages.
//!
//! An adapter submits text into a translation site's own UI; a poll loop
//! watches the page until a finished, non-placeholder result appears and
//! hands it to the host exactly once.

pub mod adapter;
pub mod adapters;
pub mod bridge;
pub mod controller;
pub mod location;
pub mod mock;
pub mod page;
pub mod request;
pub mod session;

pub use adapter::{
    OutputRegion, Placeholder, PlaceholderContext, ProfileAdapter, SiteProfile, SubmitOutcome,
    TranslationAdapter,
};
pub use adapters::{BingAdapter, GoogleAdapter, Provider};
pub use bridge::{
    init, BridgeEvent, ChannelBridge, HostBridge, PageScript, RecordingBridge, ScriptExit,
};
pub use controller::{
    poll_session, PollController, PollOptions, TickOutcome, DEFAULT_POLL_INTERVAL, DEFAULT_SUPERSEDE_HOLD,
};
pub use location::PageLocationFacts;
pub use mock::{MockDom, MockPage};
pub use page::Page;
pub use request::{LanguageCode, TranslationRequest};
pub use session::{AdapterSession, PollState, SupersededOutput};
