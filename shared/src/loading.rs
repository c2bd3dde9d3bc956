//! Load-completion aggregation.
//!
//! The host fulfils [`LoadRequest`]s in any order and reports each one back
//! with its ticket. Groups of loads that must be consumed together resolve
//! through a [`LoadJoin`]; collections that grow one completion at a time and
//! act once full use a [`Population`].

use std::collections::HashMap;

use thiserror::Error;

use crate::settings::{
    self, BARREL_MODEL, BARRELS, CONTAINER_MODEL, CONTENT_MODEL, DECORATION_VARIANTS,
    PAIR_COUNT, SHOP_COUNT, VEHICLE_MODEL, WHEEL_MODELS,
};
use crate::types::Vec3;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("asset `{0}` not found")]
    Missing(String),
    #[error("asset `{path}` failed to load: {reason}")]
    Failed { path: String, reason: String },
    #[error("no load issued for ticket {0}")]
    UnknownTicket(u32),
    #[error("ticket {0} already completed")]
    AlreadyCompleted(u32),
}

/// Whether a join may hand back a collection with failed members.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartialPolicy {
    RequireAll,
    AcceptPartial,
}

#[derive(Debug, PartialEq)]
pub enum JoinOutcome<T> {
    /// Some slots have not reported yet.
    Pending,
    /// Every slot succeeded. Issue order is preserved.
    Ready(Vec<T>),
    /// Some slots failed and the policy accepts the rest.
    Partial {
        loaded: Vec<T>,
        failed: Vec<LoadError>,
    },
    /// Some slots failed and the policy requires all of them.
    Rejected(Vec<LoadError>),
}

/// Join over a fixed number of independent loads.
#[derive(Debug)]
pub struct LoadJoin<T> {
    slots: Vec<Option<Result<T, LoadError>>>,
    taken: bool,
}

impl<T> LoadJoin<T> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
            taken: false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record one completion. A slot can only complete once.
    pub fn complete(&mut self, slot: usize, result: Result<T, LoadError>) -> Result<(), LoadError> {
        let Some(entry) = self.slots.get_mut(slot) else {
            return Err(LoadError::UnknownTicket(slot as u32));
        };
        if entry.is_some() {
            return Err(LoadError::AlreadyCompleted(slot as u32));
        }
        *entry = Some(result);
        Ok(())
    }

    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_resolved(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Consume the join once every slot has reported.
    ///
    /// Returns `Pending` while slots are outstanding or after the results were taken.
    pub fn take(&mut self, policy: PartialPolicy) -> JoinOutcome<T> {
        if self.taken || !self.is_resolved() {
            return JoinOutcome::Pending;
        }
        self.taken = true;

        let mut loaded = Vec::with_capacity(self.slots.len());
        let mut failed = Vec::new();
        for slot in self.slots.drain(..).flatten() {
            match slot {
                Ok(item) => loaded.push(item),
                Err(err) => failed.push(err),
            }
        }

        match (failed.is_empty(), policy) {
            (true, _) => JoinOutcome::Ready(loaded),
            (false, PartialPolicy::AcceptPartial) => JoinOutcome::Partial { loaded, failed },
            (false, PartialPolicy::RequireAll) => JoinOutcome::Rejected(failed),
        }
    }
}

/// Returned by [`Population::push`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Filling,
    /// The collection just reached its threshold. Reported exactly once.
    ThresholdReached,
    /// Already full; the item was dropped.
    Overflow,
}

/// Completion-ordered collection with a one-shot size threshold.
#[derive(Debug)]
pub struct Population<T> {
    items: Vec<T>,
    threshold: usize,
}

impl<T> Population<T> {
    pub fn new(threshold: usize) -> Self {
        Self {
            items: Vec::with_capacity(threshold),
            threshold,
        }
    }

    pub fn push(&mut self, item: T) -> PushOutcome {
        if self.items.len() >= self.threshold {
            return PushOutcome::Overflow;
        }
        self.items.push(item);
        if self.items.len() == self.threshold {
            PushOutcome::ThresholdReached
        } else {
            PushOutcome::Filling
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.threshold
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Monotonic loading percentage over every issued load.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadProgress {
    issued: usize,
    settled: usize,
    failed: usize,
}

impl LoadProgress {
    pub fn new(issued: usize) -> Self {
        Self {
            issued,
            ..Self::default()
        }
    }

    /// Count one settled load, success or failure.
    pub fn settle(&mut self, ok: bool) {
        if self.settled < self.issued {
            self.settled += 1;
            if !ok {
                self.failed += 1;
            }
        }
    }

    pub fn percent(&self) -> u8 {
        if self.issued == 0 {
            return 100;
        }
        ((self.settled * 100) / self.issued) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.settled >= self.issued
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

/// What the host hands back for a fulfilled load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedModel {
    /// World-space bounding box size at the requested scale.
    pub size: Vec3,
    /// Named sub-objects found in the model.
    pub parts: Vec<String>,
    /// Duration of the first animation clip, if any.
    pub clip_duration: Option<f32>,
}

impl LoadedModel {
    pub fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p == name)
    }
}

/// What a load is for. Slots are zero based within their group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadKind {
    Vehicle,
    Wheel(usize),
    Shop(usize),
    Container(usize),
    Content(usize),
    Barrel(usize),
    Decoration(usize),
    Board(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub ticket: u32,
    pub path: String,
    pub kind: LoadKind,
    /// Uniform scale the host should apply before measuring bounds.
    pub scale: f32,
}

/// Every load the scene issues at startup, addressable by ticket.
#[derive(Debug, Default)]
pub struct LoadPlan {
    requests: Vec<LoadRequest>,
    by_ticket: HashMap<u32, usize>,
    done: Vec<bool>,
}

impl LoadPlan {
    pub fn push(&mut self, path: impl Into<String>, kind: LoadKind, scale: f32) -> u32 {
        let ticket = self.requests.len() as u32;
        self.by_ticket.insert(ticket, self.requests.len());
        self.requests.push(LoadRequest {
            ticket,
            path: path.into(),
            kind,
            scale,
        });
        self.done.push(false);
        ticket
    }

    /// The full startup plan.
    pub fn startup() -> Self {
        let mut plan = Self::default();
        plan.push(VEHICLE_MODEL, LoadKind::Vehicle, 1.0);
        for (i, path) in WHEEL_MODELS.iter().enumerate() {
            plan.push(*path, LoadKind::Wheel(i), 1.0);
        }
        for i in 0..SHOP_COUNT {
            plan.push(settings::shop_model(i), LoadKind::Shop(i), settings::SHOP_SCALE);
        }
        for slot in 0..PAIR_COUNT {
            plan.push(CONTAINER_MODEL, LoadKind::Container(slot), settings::CONTAINER_SCALE);
            plan.push(CONTENT_MODEL, LoadKind::Content(slot), settings::CONTENT_SCALE);
        }
        for i in 0..BARRELS.len() {
            plan.push(BARREL_MODEL, LoadKind::Barrel(i), 1.0);
        }
        for (i, variant) in DECORATION_VARIANTS.iter().enumerate() {
            plan.push(
                settings::decoration_model(*variant),
                LoadKind::Decoration(i),
                settings::DECORATION_SCALE,
            );
        }
        for (i, (path, _)) in settings::boards().iter().enumerate() {
            plan.push(*path, LoadKind::Board(i), settings::BOARD_SCALE);
        }
        plan
    }

    pub fn requests(&self) -> &[LoadRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Mark a ticket complete and return its request.
    pub fn resolve(&mut self, ticket: u32) -> Result<&LoadRequest, LoadError> {
        let idx = *self
            .by_ticket
            .get(&ticket)
            .ok_or(LoadError::UnknownTicket(ticket))?;
        if std::mem::replace(&mut self.done[idx], true) {
            return Err(LoadError::AlreadyCompleted(ticket));
        }
        Ok(&self.requests[idx])
    }

    pub fn count(&self, pred: impl Fn(&LoadKind) -> bool) -> usize {
        self.requests.iter().filter(|r| pred(&r.kind)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_keeps_issue_order_regardless_of_completion_order() {
        let mut join = LoadJoin::new(3);
        join.complete(2, Ok("c")).unwrap();
        assert_eq!(join.take(PartialPolicy::RequireAll), JoinOutcome::Pending);
        join.complete(0, Ok("a")).unwrap();
        join.complete(1, Ok("b")).unwrap();
        assert_eq!(
            join.take(PartialPolicy::RequireAll),
            JoinOutcome::Ready(vec!["a", "b", "c"])
        );
        assert_eq!(join.take(PartialPolicy::RequireAll), JoinOutcome::Pending);
    }

    #[test]
    fn join_failure_follows_policy() {
        let fail = || LoadError::Missing("wheel".into());

        let mut strict = LoadJoin::<u8>::new(2);
        strict.complete(0, Ok(1)).unwrap();
        strict.complete(1, Err(fail())).unwrap();
        assert_eq!(
            strict.take(PartialPolicy::RequireAll),
            JoinOutcome::Rejected(vec![fail()])
        );

        let mut lenient = LoadJoin::<u8>::new(2);
        lenient.complete(0, Ok(1)).unwrap();
        lenient.complete(1, Err(fail())).unwrap();
        assert_eq!(
            lenient.take(PartialPolicy::AcceptPartial),
            JoinOutcome::Partial {
                loaded: vec![1],
                failed: vec![fail()]
            }
        );
    }

    #[test]
    fn join_rejects_double_and_out_of_range_completion() {
        let mut join = LoadJoin::new(1);
        join.complete(0, Ok(())).unwrap();
        assert_eq!(join.complete(0, Ok(())), Err(LoadError::AlreadyCompleted(0)));
        assert_eq!(join.complete(4, Ok(())), Err(LoadError::UnknownTicket(4)));
    }

    #[test]
    fn population_threshold_fires_once() {
        let mut pop = Population::new(2);
        assert_eq!(pop.push(1), PushOutcome::Filling);
        assert_eq!(pop.push(2), PushOutcome::ThresholdReached);
        assert_eq!(pop.push(3), PushOutcome::Overflow);
        assert_eq!(pop.items(), &[1, 2]);
    }

    #[test]
    fn progress_is_monotonic_and_capped() {
        let mut progress = LoadProgress::new(4);
        let mut last = progress.percent();
        for ok in [true, false, true, true, true] {
            progress.settle(ok);
            assert!(progress.percent() >= last);
            last = progress.percent();
        }
        assert_eq!(progress.percent(), 100);
        assert_eq!(progress.failed(), 1);
        assert!(progress.is_complete());
    }

    #[test]
    fn startup_plan_covers_every_group() {
        let plan = LoadPlan::startup();
        assert_eq!(plan.count(|k| matches!(k, LoadKind::Wheel(_))), 4);
        assert_eq!(plan.count(|k| matches!(k, LoadKind::Shop(_))), SHOP_COUNT);
        assert_eq!(plan.count(|k| matches!(k, LoadKind::Container(_))), PAIR_COUNT);
        assert_eq!(plan.count(|k| matches!(k, LoadKind::Content(_))), PAIR_COUNT);
        assert_eq!(plan.count(|k| matches!(k, LoadKind::Decoration(_))), 8);
        assert_eq!(plan.count(|k| matches!(k, LoadKind::Barrel(_))), 7);
    }

    #[test]
    fn plan_resolves_each_ticket_once() {
        let mut plan = LoadPlan::startup();
        let kind = plan.resolve(0).map(|r| r.kind).unwrap();
        assert_eq!(kind, LoadKind::Vehicle);
        assert_eq!(plan.resolve(0).err(), Some(LoadError::AlreadyCompleted(0)));
        assert_eq!(plan.resolve(9999).err(), Some(LoadError::UnknownTicket(9999)));
    }
}
