//! Form state and the controller that keeps the conversion result in sync
//! with the inputs.
//!
//! Every mutation runs a change-detection pass over `(source, target, amount)`.
//! When the triple changed and the amount is positive, a [`FetchTicket`] is
//! issued. Tickets carry a sequence number and only the latest one may write
//! its result, so a slow response for superseded inputs can never overwrite a
//! newer one.

use super::amount;
use super::conversion::{ConversionRequest, ConversionResult, RateFetcher};
use super::currency::normalize_code;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_SOURCE: &str = "USD";
pub const DEFAULT_TARGET: &str = "IDR";
pub const RESULT_UNAVAILABLE: &str = "Exchange rate not available";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub source: String,
    pub target: String,
    /// Canonical amount digits.
    pub amount: String,
    pub result: Option<ConversionResult>,
    pub is_loading: bool,
}

impl ViewState {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: normalize_code(source),
            target: normalize_code(target),
            amount: String::new(),
            result: None,
            is_loading: false,
        }
    }

    pub fn request(&self) -> ConversionRequest {
        ConversionRequest::new(&self.source, &self.target, &self.amount)
    }

    pub fn amount_display(&self) -> String {
        amount::to_display(&self.amount)
    }

    /// `"<amount> <source> = <converted> <target>"`, or the fallback text when
    /// there is nothing to show for the current amount.
    pub fn result_line(&self) -> String {
        match &self.result {
            Some(result) if self.request().is_convertible() => format!(
                "{} {} = {} {}",
                amount::to_display(&result.request.amount),
                result.request.source,
                result.converted_display(),
                result.request.target
            ),
            _ => RESULT_UNAVAILABLE.to_string(),
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_loading {
            "Converting..."
        } else {
            "Convert"
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE, DEFAULT_TARGET)
    }
}

/// A rate fetch issued by the [`Converter`]. It must be passed to
/// [`Converter::run`] or [`Converter::dispatch`], otherwise the form stays in
/// the loading state.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    request: ConversionRequest,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &ConversionRequest {
        &self.request
    }
}

struct Inner {
    view: ViewState,
    observed: ConversionRequest,
    latest_seq: u64,
    in_flight: usize,
}

impl Inner {
    fn detect_change(&mut self) -> Option<FetchTicket> {
        let current = self.view.request();
        if current == self.observed {
            return None;
        }
        debug!(
            source = %current.source,
            target = %current.target,
            amount = %current.amount,
            "Conversion inputs changed"
        );
        self.observed = current.clone();
        // Outstanding tickets now answer stale inputs
        self.latest_seq += 1;
        if !current.is_convertible() {
            return None;
        }
        Some(self.begin(current))
    }

    fn begin(&mut self, request: ConversionRequest) -> FetchTicket {
        self.in_flight += 1;
        self.view.is_loading = true;
        FetchTicket {
            seq: self.latest_seq,
            request,
        }
    }
}

pub struct Converter {
    fetcher: RateFetcher,
    inner: Mutex<Inner>,
    updates: watch::Sender<ViewState>,
}

impl Converter {
    pub fn new(fetcher: RateFetcher, initial: ViewState) -> Self {
        let (updates, _) = watch::channel(initial.clone());
        Self {
            fetcher,
            inner: Mutex::new(Inner {
                observed: initial.request(),
                view: initial,
                latest_seq: 0,
                in_flight: 0,
            }),
            updates,
        }
    }

    pub async fn snapshot(&self) -> ViewState {
        self.inner.lock().await.view.clone()
    }

    /// Receives a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.updates.subscribe()
    }

    /// Applies an edit of the amount field. Text that is not digits and
    /// grouping separators is ignored.
    pub async fn edit_amount(&self, display_text: &str) -> Option<FetchTicket> {
        self.update(|view| view.amount = amount::apply_edit(&view.amount, display_text))
            .await
    }

    pub async fn select_source(&self, code: &str) -> Option<FetchTicket> {
        self.update(|view| view.source = normalize_code(code)).await
    }

    pub async fn select_target(&self, code: &str) -> Option<FetchTicket> {
        self.update(|view| view.target = normalize_code(code)).await
    }

    /// Exchanges source and target. Both change before detection runs, so a
    /// swap issues at most one ticket.
    pub async fn swap(&self) -> Option<FetchTicket> {
        self.update(|view| std::mem::swap(&mut view.source, &mut view.target))
            .await
    }

    /// Explicit conversion request. Refetches unchanged inputs, but is ignored
    /// while a fetch is in flight or when the amount is not positive.
    pub async fn convert(&self) -> Option<FetchTicket> {
        let mut inner = self.inner.lock().await;
        if inner.view.is_loading {
            debug!("Conversion already in progress, ignoring request");
            return None;
        }
        let request = inner.view.request();
        if !request.is_convertible() {
            return None;
        }
        inner.observed = request.clone();
        inner.latest_seq += 1;
        let ticket = inner.begin(request);
        self.publish(&inner.view);
        Some(ticket)
    }

    /// Performs the fetch for `ticket` and applies its outcome if the ticket is
    /// still the latest one. Loading is released either way.
    pub async fn run(&self, ticket: FetchTicket) {
        let result = self.fetcher.fetch(&ticket.request).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.view.is_loading = inner.in_flight > 0;
        if ticket.seq == inner.latest_seq {
            inner.view.result = result;
        } else {
            warn!(
                seq = ticket.seq,
                latest = inner.latest_seq,
                "Discarding result of superseded conversion"
            );
        }
        self.publish(&inner.view);
    }

    /// Runs `ticket` on the tokio runtime without blocking the caller.
    pub fn dispatch(self: &Arc<Self>, ticket: FetchTicket) -> JoinHandle<()> {
        let converter = Arc::clone(self);
        tokio::spawn(async move { converter.run(ticket).await })
    }

    async fn update(&self, mutate: impl FnOnce(&mut ViewState)) -> Option<FetchTicket> {
        let mut inner = self.inner.lock().await;
        mutate(&mut inner.view);
        let ticket = inner.detect_change();
        self.publish(&inner.view);
        ticket
    }

    fn publish(&self, view: &ViewState) {
        self.updates.send_replace(view.clone());
    }
}
