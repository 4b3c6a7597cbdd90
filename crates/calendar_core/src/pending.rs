//! Optimistic local edits mirrored against a confirmed remote value.
//!
//! A [`Mirror`] shows the pending value while a write is in flight and only
//! drops the pending marker once a confirmed value arrives that matches it.

use crate::weather::WeatherSample;

/// Equality used when reconciling a pending write with a confirmed value.
pub trait Reconcile {
    fn matches(&self, confirmed: &Self) -> bool;
}

impl Reconcile for u32 {
    fn matches(&self, confirmed: &Self) -> bool {
        self == confirmed
    }
}

/// Strength-like scalars round-trip through storage with some loss.
pub const SCALAR_TOLERANCE: f64 = 1e-3;

impl Reconcile for f64 {
    fn matches(&self, confirmed: &Self) -> bool {
        (self - confirmed).abs() <= SCALAR_TOLERANCE
    }
}

/// Degrees a stored temperature may drift from the edited one.
pub const TEMPERATURE_TOLERANCE: i32 = 0;

impl Reconcile for WeatherSample {
    fn matches(&self, confirmed: &Self) -> bool {
        self.kind == confirmed.kind
            && (self.temperature - confirmed.temperature).abs() <= TEMPERATURE_TOLERANCE
            && self.description == confirmed.description
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mirror<T> {
    confirmed: T,
    pending: Option<T>,
}

impl<T: Reconcile> Mirror<T> {
    pub fn new(confirmed: T) -> Self {
        Self {
            confirmed,
            pending: None,
        }
    }

    /// Record a local edit that has been sent but not yet confirmed.
    pub fn propose(&mut self, value: T) {
        self.pending = Some(value);
    }

    /// Accept a confirmed value. Returns `true` if it settled the pending edit.
    pub fn confirm(&mut self, confirmed: T) -> bool {
        let settled = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.matches(&confirmed));
        if settled {
            self.pending = None;
        }
        self.confirmed = confirmed;
        settled
    }

    /// Abandon the pending edit, e.g. after the write was rejected.
    pub fn rollback(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn current(&self) -> &T {
        self.pending.as_ref().unwrap_or(&self.confirmed)
    }

    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
