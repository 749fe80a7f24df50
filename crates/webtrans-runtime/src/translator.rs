//! WebTranslator: runs queued items one at a time against a shared page.
//!
//! Each item is tried with the configured providers in turn. A provider
//! attempt drives the page script: submit, follow navigations by waiting for
//! the new document and re-issuing the request, then wait for the bridge to
//! report a result or an expiry.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webtrans_core::{Error, Result};
use webtrans_engine::{
    init, BridgeEvent, ChannelBridge, Page, PageScript, PollOptions, ScriptExit,
    TranslationAdapter, TranslationRequest,
};

use crate::config::TranslationSettings;
use crate::types::*;

const EVENT_CAPACITY: usize = 64;

struct Job {
    item: TranslationItem,
    request: TranslationRequest,
    reply: Option<oneshot::Sender<Result<TranslationOutcome>>>,
}

#[derive(Default)]
struct WorkerState {
    in_flight: Option<TranslationItem>,
    current_provider: Option<String>,
    next_start: usize,
    stats: TranslatorStats,
}

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Job>,
    closed: bool,
}

struct Inner {
    page: Arc<dyn Page>,
    settings: RwLock<TranslationSettings>,
    queue: Mutex<Queue>,
    wake: Notify,
    events: broadcast::Sender<TranslatorEvent>,
    state: Mutex<WorkerState>,
}

impl Inner {
    fn next_job(&self) -> Option<Job> {
        self.queue.lock().jobs.pop_front()
    }
}

/// Translation queue bound to one page.
pub struct WebTranslator {
    inner: Arc<Inner>,
    worker: JoinHandle<()>,
}

impl WebTranslator {
    /// Start the worker. Must be called inside a tokio runtime.
    pub fn new(page: Arc<dyn Page>, settings: TranslationSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        info!(
            "WebTranslator initialized: providers={:?}, timeout={}s",
            settings.providers, settings.timeout_secs
        );
        let inner = Arc::new(Inner {
            page,
            settings: RwLock::new(settings),
            queue: Mutex::new(Queue::default()),
            wake: Notify::new(),
            events,
            state: Mutex::new(WorkerState::default()),
        });

        let (bridge, bridge_events) = ChannelBridge::new();
        let worker = Worker {
            inner: inner.clone(),
            bridge,
            bridge_events,
            script: None,
            last_delivered: None,
        };
        let worker = tokio::spawn(worker.run());
        Self { inner, worker }
    }

    /// Queue an item without waiting for it. The outcome is only reported
    /// through [`subscribe`](Self::subscribe).
    pub fn enqueue(&self, text: &str, source: &str, target: &str) -> Result<TranslationItem> {
        let (item, request) = Self::prepare(text, source, target)?;
        self.push(Job {
            item: item.clone(),
            request,
            reply: None,
        })?;
        Ok(item)
    }

    /// Queue an item and wait for its outcome.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> Result<TranslationOutcome> {
        let (item, request) = Self::prepare(text, source, target)?;
        let (tx, rx) = oneshot::channel();
        self.push(Job {
            item,
            request,
            reply: Some(tx),
        })?;
        rx.await
            .map_err(|_| Error::Cancelled("translator stopped before the item finished".into()))?
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranslatorEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> TranslatorStatus {
        let queued = self.inner.queue.lock().jobs.len();
        let providers = self.inner.settings.read().providers.clone();
        let state = self.inner.state.lock();
        TranslatorStatus {
            queued,
            in_flight: state.in_flight.clone(),
            current_provider: state.current_provider.clone(),
            providers,
            stats: state.stats.clone(),
        }
    }

    pub fn settings(&self) -> TranslationSettings {
        self.inner.settings.read().clone()
    }

    /// Validate, persist and apply new settings. Items already running keep
    /// the settings they started with. Nothing changes if the file cannot be
    /// written.
    pub fn update_settings(&self, mut updated: TranslationSettings) -> Result<()> {
        updated.validate()?;
        updated.config_path = self.inner.settings.read().config_path.clone();
        if !updated.config_path.as_os_str().is_empty() {
            updated.save()?;
        }
        *self.inner.settings.write() = updated;
        Ok(())
    }

    /// Stop the worker. Queued and running items fail with `Cancelled`.
    pub fn shutdown(&self) {
        let mut queue = self.inner.queue.lock();
        queue.closed = true;
        queue.jobs.clear();
        self.worker.abort();
        info!("WebTranslator stopped");
    }

    fn prepare(text: &str, source: &str, target: &str) -> Result<(TranslationItem, TranslationRequest)> {
        let request = TranslationRequest::new(text, source, target)?;
        let item = TranslationItem::new(
            request.text(),
            request.source().as_str(),
            request.target().as_str(),
        );
        Ok((item, request))
    }

    fn push(&self, job: Job) -> Result<()> {
        let mut queue = self.inner.queue.lock();
        if queue.closed {
            return Err(Error::Cancelled("translator is shut down".into()));
        }
        debug!(item = %job.item.id, "queued");
        queue.jobs.push_back(job);
        self.inner.wake.notify_one();
        Ok(())
    }
}

impl Drop for WebTranslator {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

enum Step {
    Bridge(Option<BridgeEvent>),
    Exit(ScriptExit),
}

struct Worker {
    inner: Arc<Inner>,
    bridge: Arc<ChannelBridge>,
    bridge_events: mpsc::UnboundedReceiver<BridgeEvent>,
    /// Kept across items while the provider stays the same, so the session
    /// remembers what it already delivered on this page.
    script: Option<PageScript>,
    /// Last request the running script delivered, with its result. The
    /// session suppresses a repeat of that output, so a repeated request is
    /// answered from here.
    last_delivered: Option<(TranslationRequest, String)>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            let Some(job) = self.inner.next_job() else {
                self.inner.wake.notified().await;
                continue;
            };
            self.inner.state.lock().in_flight = Some(job.item.clone());

            let result = self.process(&job).await;

            let event = {
                let mut state = self.inner.state.lock();
                state.in_flight = None;
                state.current_provider = None;
                match &result {
                    Ok(outcome) => {
                        state.stats.completed += 1;
                        info!(item = %job.item.id, provider = %outcome.provider, "translated");
                        TranslatorEvent::Translated(outcome.clone())
                    }
                    Err(e) => {
                        state.stats.failed += 1;
                        warn!(item = %job.item.id, error = %e, "translation failed");
                        TranslatorEvent::Failed {
                            item: job.item.clone(),
                            error: e.to_string(),
                        }
                    }
                }
            };
            let _ = self.inner.events.send(event);
            if let Some(reply) = job.reply {
                let _ = reply.send(result);
            }
        }
    }

    async fn process(&mut self, job: &Job) -> Result<TranslationOutcome> {
        let settings = self.inner.settings.read().clone();
        let adapters = settings.adapters()?;
        if adapters.is_empty() {
            return Err(Error::Config("no providers configured".into()));
        }

        let start = if settings.force_rotate {
            let mut state = self.inner.state.lock();
            let start = state.next_start % adapters.len();
            state.next_start = start + 1;
            start
        } else {
            0
        };

        let mut last_error = None;
        for offset in 0..adapters.len() {
            let adapter = adapters[(start + offset) % adapters.len()].clone();
            {
                let mut state = self.inner.state.lock();
                state.current_provider = Some(adapter.name().to_string());
                if offset > 0 {
                    state.stats.rotations += 1;
                }
            }

            match self.attempt(adapter.clone(), &job.request, &settings).await {
                Ok(translated) => {
                    return Ok(TranslationOutcome {
                        item: job.item.clone(),
                        translated,
                        provider: adapter.name().to_string(),
                    })
                }
                Err(e) => {
                    warn!(provider = adapter.name(), item = %job.item.id, error = %e, "provider attempt failed");
                    self.stop_script().await;
                    if !e.is_transient() {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::Internal("no provider attempted".into())))
    }

    async fn attempt(
        &mut self,
        adapter: Arc<dyn TranslationAdapter>,
        request: &TranslationRequest,
        settings: &TranslationSettings,
    ) -> Result<String> {
        let options = settings.poll_options();
        let reusable = self
            .script
            .as_ref()
            .is_some_and(|s| s.is_running() && s.adapter() == adapter.name());
        if reusable {
            if let Some((_, text)) = self.last_delivered.as_ref().filter(|(r, _)| r == request) {
                debug!(provider = adapter.name(), "repeated request, reusing result on screen");
                return Ok(text.clone());
            }
        } else {
            self.stop_script().await;
            self.start_script(adapter.clone(), options.clone()).await;
        }
        self.discard_stale_events();
        self.submit(request)?;

        let mut navigations = 0;
        loop {
            let step = {
                let script = self
                    .script
                    .as_mut()
                    .ok_or_else(|| Error::Internal("page script missing".into()))?;
                tokio::select! {
                    event = self.bridge_events.recv() => Step::Bridge(event),
                    exit = script.exited() => Step::Exit(exit),
                }
            };

            match step {
                Step::Bridge(Some(BridgeEvent::Translated(text))) => {
                    self.last_delivered = Some((request.clone(), text.clone()));
                    return Ok(text);
                }
                Step::Bridge(Some(BridgeEvent::Expired(_))) => {
                    return Err(Error::Timeout(format!(
                        "{} showed no result within {}s",
                        adapter.name(),
                        settings.timeout_secs
                    )))
                }
                Step::Bridge(None) => return Err(Error::Internal("bridge channel closed".into())),
                Step::Exit(ScriptExit::Navigated { url }) => {
                    navigations += 1;
                    self.inner.state.lock().stats.navigations += 1;
                    if navigations > settings.max_navigations {
                        return Err(Error::Navigation(format!(
                            "{} did not settle after {} page loads (last {})",
                            adapter.name(),
                            settings.max_navigations,
                            url
                        )));
                    }
                    wait_for_load(self.inner.page.as_ref(), settings.load_timeout(), options.interval).await?;
                    self.start_script(adapter.clone(), options.clone()).await;
                    self.submit(request)?;
                }
                Step::Exit(ScriptExit::SubmitFailed { error }) => {
                    return Err(Error::Navigation(format!("{}: {}", adapter.name(), error)))
                }
                Step::Exit(ScriptExit::Shutdown) => {
                    return Err(Error::Cancelled("page script stopped".into()))
                }
            }
        }
    }

    async fn start_script(&mut self, adapter: Arc<dyn TranslationAdapter>, options: PollOptions) {
        let script = init(self.inner.page.clone(), adapter, self.bridge.clone(), options).await;
        self.script = Some(script);
        self.last_delivered = None;
    }

    async fn stop_script(&mut self) {
        self.last_delivered = None;
        if let Some(script) = self.script.take() {
            let exit = script.shutdown().await;
            debug!(?exit, "page script stopped");
        }
    }

    fn submit(&self, request: &TranslationRequest) -> Result<()> {
        self.script
            .as_ref()
            .ok_or_else(|| Error::Internal("page script missing".into()))?
            .submit(request.clone())
    }

    fn discard_stale_events(&mut self) {
        while let Ok(event) = self.bridge_events.try_recv() {
            debug!(?event, "discarding event from an earlier request");
        }
    }
}

/// Wait until the page reports `document.readyState == "complete"`.
pub async fn wait_for_load(page: &dyn Page, timeout: Duration, interval: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match page.ready_state().await {
            Ok(state) if state == "complete" => return Ok(()),
            Ok(state) => debug!(%state, "page still loading"),
            Err(e) => debug!(error = %e, "ready state unavailable"),
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::Navigation(format!(
                "page did not finish loading within {:?}",
                timeout
            )));
        }
        tokio::time::sleep(interval).await;
    }
}
