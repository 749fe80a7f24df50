//! Host bridge and the page-script entry point.
//!
//! A [`PageScript`] is started once per page load by [`init`]. It owns the
//! session, accepts `translate` calls from the host and reports results
//! through a [`HostBridge`].
//!
//! A full navigation ends the script. The host must wait for the new page,
//! call [`init`] again and re-issue the request; nothing crosses that
//! boundary. A fragment-only change keeps the document, so the script stays.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use webtrans_core::{Error, Result};

use crate::adapter::{SubmitOutcome, TranslationAdapter};
use crate::controller::{PollController, PollOptions};
use crate::location::PageLocationFacts;
use crate::page::Page;
use crate::request::TranslationRequest;

/// Upcalls from the page script to the host.
pub trait HostBridge: Send + Sync {
    /// Called exactly once per accepted result.
    fn set_translated(&self, text: &str);

    /// Called when a pending request reaches its timeout.
    fn request_expired(&self, _request: Option<&TranslationRequest>) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    Translated(String),
    Expired(Option<TranslationRequest>),
}

/// Bridge that forwards every upcall over a channel.
#[derive(Debug, Clone)]
pub struct ChannelBridge {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl ChannelBridge {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }

    fn send(&self, event: BridgeEvent) {
        if self.tx.send(event).is_err() {
            debug!("bridge receiver dropped, discarding event");
        }
    }
}

impl HostBridge for ChannelBridge {
    fn set_translated(&self, text: &str) {
        self.send(BridgeEvent::Translated(text.to_string()));
    }

    fn request_expired(&self, request: Option<&TranslationRequest>) {
        self.send(BridgeEvent::Expired(request.cloned()));
    }
}

/// Bridge that only records what it was given.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    delivered: Mutex<Vec<String>>,
    expired: Mutex<usize>,
}

impl RecordingBridge {
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().clone()
    }

    pub fn expired(&self) -> usize {
        *self.expired.lock()
    }
}

impl HostBridge for RecordingBridge {
    fn set_translated(&self, text: &str) {
        self.delivered.lock().push(text.to_string());
    }

    fn request_expired(&self, _request: Option<&TranslationRequest>) {
        *self.expired.lock() += 1;
    }
}

#[derive(Debug)]
enum PageCommand {
    Translate(TranslationRequest),
    Cancel,
}

/// Why a page script stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptExit {
    /// A submission navigated away; the page context is gone.
    Navigated { url: String },
    /// A submission could not be carried out; the page is in an unknown
    /// state and the host should start over.
    SubmitFailed { error: String },
    /// The host dropped or shut down the script.
    Shutdown,
}

/// Handle to the script running in one page load.
pub struct PageScript {
    adapter: String,
    commands: Option<mpsc::UnboundedSender<PageCommand>>,
    task: JoinHandle<ScriptExit>,
    exit: Option<ScriptExit>,
}

impl PageScript {
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// Host inbound call: `translate(text, sourceLang, targetLang)`.
    pub fn translate(&self, text: &str, source: &str, target: &str) -> Result<()> {
        self.submit(TranslationRequest::new(text, source, target)?)
    }

    pub fn submit(&self, request: TranslationRequest) -> Result<()> {
        self.send(PageCommand::Translate(request))
    }

    /// Drop the pending wait without submitting anything new.
    pub fn cancel(&self) -> Result<()> {
        self.send(PageCommand::Cancel)
    }

    pub fn is_running(&self) -> bool {
        self.exit.is_none() && !self.task.is_finished()
    }

    /// Resolves once the script stops. Safe to await repeatedly.
    pub async fn exited(&mut self) -> ScriptExit {
        if let Some(exit) = &self.exit {
            return exit.clone();
        }
        let exit = match (&mut self.task).await {
            Ok(exit) => exit,
            Err(e) => {
                warn!(adapter = %self.adapter, error = %e, "page script task failed");
                ScriptExit::Shutdown
            }
        };
        self.exit = Some(exit.clone());
        exit
    }

    /// Stop the script and wait for it.
    pub async fn shutdown(mut self) -> ScriptExit {
        self.commands = None;
        self.exited().await
    }

    fn send(&self, command: PageCommand) -> Result<()> {
        let gone = || Error::Cancelled(format!("{} page script has exited", self.adapter));
        self.commands
            .as_ref()
            .ok_or_else(gone)?
            .send(command)
            .map_err(|_| gone())
    }
}

impl std::fmt::Debug for PageScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageScript")
            .field("adapter", &self.adapter)
            .field("exit", &self.exit)
            .finish()
    }
}

/// Page-load entry point: bind the host's inbound calls to `adapter` on this
/// page and start the poll timer.
pub async fn init(
    page: Arc<dyn Page>,
    adapter: Arc<dyn TranslationAdapter>,
    bridge: Arc<dyn HostBridge>,
    options: PollOptions,
) -> PageScript {
    let facts = match page.location().await {
        Ok(href) => PageLocationFacts::parse(&href),
        Err(e) => {
            debug!(error = %e, "location unavailable, assuming blank page");
            PageLocationFacts::blank()
        }
    };
    info!(adapter = adapter.name(), location = facts.href(), "page script started");

    let name = adapter.name().to_string();
    let controller = PollController::new(adapter, page, bridge, options, &facts);
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(controller, rx));

    PageScript {
        adapter: name,
        commands: Some(tx),
        task,
        exit: None,
    }
}

async fn run(
    mut controller: PollController,
    mut commands: mpsc::UnboundedReceiver<PageCommand>,
) -> ScriptExit {
    let mut ticker = tokio::time::interval(controller.options().interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // Host calls win over a due tick so a stale result on screen
            // is never reported for a request that is already queued.
            biased;

            command = commands.recv() => match command {
                Some(PageCommand::Translate(request)) => match controller.submit(request).await {
                    Ok(SubmitOutcome::Navigated { url }) => {
                        debug!(%url, "page script ends with navigation");
                        return ScriptExit::Navigated { url };
                    }
                    Ok(SubmitOutcome::SameDocument { url }) => {
                        debug!(%url, "fragment changed, page script stays");
                    }
                    Ok(SubmitOutcome::InputUpdated) => {}
                    Err(e) => {
                        warn!(error = %e, "submission failed");
                        controller.cancel();
                        return ScriptExit::SubmitFailed { error: e.to_string() };
                    }
                },
                Some(PageCommand::Cancel) => {
                    controller.cancel();
                }
                None => return ScriptExit::Shutdown,
            },
            _ = ticker.tick() => {
                controller.tick().await;
            }
        }
    }
}
