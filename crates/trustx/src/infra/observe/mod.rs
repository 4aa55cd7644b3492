//! Observability of the adapter. Every function represents an event that is
//! meaningful to the system: it gets logged and, if it is worth measuring,
//! counted.

use {
    crate::{
        domain::{
            demand::{Bids, Dropped, Error, Outcome, Token},
            placement::{self, Resolution},
        },
        infra::transport,
        util::http,
    },
    std::time::Duration,
    url::Url,
};

pub mod metrics;

/// Setup the observability. The log argument configures the tracing filter.
pub fn init(log: &str) {
    observe::tracing::initialize(log, tracing::level_filters::LevelFilter::ERROR);
    metrics::init();
}

/// Observe that a bid request is about to be issued.
pub fn requesting(token: &Token, resolution: &Resolution) {
    tracing::debug!(
        %token,
        slots = ?resolution.slots(),
        placements = ?resolution.placements(),
        "requesting demand"
    );
}

/// Observe that the wrapper slots resolved to no placement at all.
pub fn nothing_to_request(slots: &[placement::HtSlot]) {
    tracing::debug!(?slots, "no placements configured for slots, not requesting");
}

pub fn sending(request: &transport::Request) {
    tracing::trace!(url = %request.url, query = ?request.query, "sending bid request");
}

pub fn received(url: &Url, res: Result<&str, &http::Error>) {
    match res {
        Ok(res) => tracing::trace!(%url, %res, "received bid response"),
        Err(err) => tracing::warn!(%url, ?err, "failed to receive bid response"),
    }
}

/// Observe a bid that did not make it into the demand.
pub fn dropped_bid(token: &Token, auid: Option<u64>, reason: Dropped) {
    tracing::debug!(%token, ?auid, ?reason, "dropped bid");
    metrics::get()
        .bids
        .with_label_values(&[reason.label()])
        .inc();
}

pub fn accepted_bid(token: &Token, placement: placement::Id) {
    tracing::trace!(%token, %placement, "accepted bid");
    metrics::get().bids.with_label_values(&["accepted"]).inc();
}

/// Observe a response for a request nobody waits for anymore. Its creatives
/// were stored regardless.
pub fn late_response(token: &Token) {
    tracing::debug!(%token, "late response");
    metrics::get().late_responses.inc();
}

/// Observe a response for a token that is not pending.
pub fn unknown_token(token: &Token) {
    tracing::debug!(%token, "response for unknown token");
}

/// Observe that an exchange outlived the time it was allowed to take.
pub fn exchange_expired(token: &Token, limit: Duration) {
    tracing::debug!(%token, ?limit, "abandoning bid request");
}

/// Observe the completion of a bid request as seen by its caller.
pub fn completed(token: &Token, result: &Result<Bids, Error>, elapsed: Duration) {
    let outcome = Outcome::of(result);
    match result {
        Ok(bids) => tracing::debug!(%token, bids = bids.len(), ?elapsed, "received demand"),
        Err(err) => tracing::warn!(%token, ?outcome, ?elapsed, %err, "failed to get demand"),
    }
    let metrics = metrics::get();
    metrics
        .requests
        .with_label_values(&[outcome.label()])
        .inc();
    metrics
        .request_duration
        .with_label_values(&[outcome.label()])
        .observe(elapsed.as_secs_f64());
}

pub fn beacon_failed(url: &Url, err: &reqwest::Error) {
    tracing::debug!(%url, ?err, "failed to send beacon");
}
