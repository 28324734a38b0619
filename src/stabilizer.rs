//! Re-runs connector routing while the rendering surface settles.
//!
//! Measurements are only trustworthy once images have loaded and the surface
//! has reflowed, so every member-list change schedules several full
//! recomputations. Each pass replaces the previous connector set; nothing is
//! merged. A newer member list cancels all pending passes before scheduling
//! its own, so a pass never pairs old assumptions with new members.
//!
//! The stabilizer owns no clock. Hosts feed a monotonic `now` and call
//! [`LayoutStabilizer::poll`] whenever a timer they armed for
//! [`LayoutStabilizer::next_due`] fires.

use std::time::Duration;

use crate::config::{RouterConfig, StabilizerConfig};
use crate::geometry::GeometryProvider;
use crate::layout::{ConnectorDescriptor, FamilyGroup, group_families, route_connectors};
use crate::member::Member;

/// Decides when recomputation passes happen.
pub trait SettleStrategy {
    /// Offsets from a member-list change at which to recompute.
    fn after_change(&self) -> Vec<Duration>;

    /// Offsets from a viewport resize at which to recompute.
    fn after_resize(&self) -> Vec<Duration>;
}

/// A fixed list of retry delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    delays: Vec<Duration>,
    resize_delay: Duration,
}

impl RetrySchedule {
    pub fn new(delays: Vec<Duration>, resize_delay: Duration) -> Self {
        Self { delays, resize_delay }
    }

    pub fn from_config(config: &StabilizerConfig) -> Self {
        Self::new(config.delays(), config.resize_delay())
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::from_config(&StabilizerConfig::default())
    }
}

impl SettleStrategy for RetrySchedule {
    fn after_change(&self) -> Vec<Duration> {
        self.delays.clone()
    }

    fn after_resize(&self) -> Vec<Duration> {
        vec![self.resize_delay]
    }
}

/// For surfaces that report when layout has settled: no timers at all, the
/// host calls [`LayoutStabilizer::layout_settled`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettledSignal;

impl SettleStrategy for SettledSignal {
    fn after_change(&self) -> Vec<Duration> {
        Vec::new()
    }

    fn after_resize(&self) -> Vec<Duration> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassCause {
    MembersChanged,
    Resized,
    Settled,
}

#[derive(Debug, Clone, Copy)]
struct PendingPass {
    due: Duration,
    cause: PassCause,
}

#[derive(Debug, Clone)]
pub struct LayoutStabilizer<S = RetrySchedule> {
    strategy: S,
    router: RouterConfig,
    /// Bumped on every member-list change.
    snapshot: u64,
    families: Vec<FamilyGroup>,
    pending: Vec<PendingPass>,
    connectors: Vec<ConnectorDescriptor>,
    passes_run: usize,
}

impl<S: SettleStrategy> LayoutStabilizer<S> {
    pub fn new(strategy: S, router: RouterConfig) -> Self {
        Self {
            strategy,
            router,
            snapshot: 0,
            families: Vec::new(),
            pending: Vec::new(),
            connectors: Vec::new(),
            passes_run: 0,
        }
    }

    /// Takes a new member snapshot and reschedules every pass.
    pub fn members_changed(&mut self, now: Duration, members: &[Member]) {
        let cancelled = self.pending.len();
        self.pending.clear();
        self.snapshot += 1;
        self.families = group_families(members);
        for delay in self.strategy.after_change() {
            self.schedule(now.saturating_add(delay), PassCause::MembersChanged);
        }
        tracing::debug!(
            snapshot = self.snapshot,
            cancelled,
            scheduled = self.pending.len(),
            families = self.families.len(),
            "member list changed"
        );
    }

    pub fn viewport_resized(&mut self, now: Duration) {
        for delay in self.strategy.after_resize() {
            self.schedule(now.saturating_add(delay), PassCause::Resized);
        }
    }

    /// Host-reported "layout is stable now": recompute on the next poll.
    pub fn layout_settled(&mut self, now: Duration) {
        self.schedule(now, PassCause::Settled);
    }

    /// Runs one recomputation if any pass is due, covering every due pass.
    pub fn poll(&mut self, now: Duration, geometry: &dyn GeometryProvider) -> Option<&[ConnectorDescriptor]> {
        let due: Vec<PassCause> = self
            .pending
            .iter()
            .filter(|pass| pass.due <= now)
            .map(|pass| pass.cause)
            .collect();
        if due.is_empty() {
            return None;
        }
        self.pending.retain(|pass| pass.due > now);
        tracing::trace!(?due, remaining = self.pending.len(), "running stabilization pass");
        self.recompute(geometry);
        Some(self.connectors.as_slice())
    }

    /// Runs a pass immediately and drops everything still pending.
    pub fn flush(&mut self, geometry: &dyn GeometryProvider) -> &[ConnectorDescriptor] {
        self.pending.clear();
        self.recompute(geometry);
        &self.connectors
    }

    /// When the host should call [`poll`](Self::poll) next.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|pass| pass.due).min()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn connectors(&self) -> &[ConnectorDescriptor] {
        &self.connectors
    }

    pub fn families(&self) -> &[FamilyGroup] {
        &self.families
    }

    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    pub fn passes_run(&self) -> usize {
        self.passes_run
    }

    fn schedule(&mut self, due: Duration, cause: PassCause) {
        self.pending.push(PendingPass { due, cause });
    }

    fn recompute(&mut self, geometry: &dyn GeometryProvider) {
        self.connectors = route_connectors(&self.families, geometry, &self.router);
        self.passes_run += 1;
    }
}

impl Default for LayoutStabilizer<RetrySchedule> {
    fn default() -> Self {
        Self::new(RetrySchedule::default(), RouterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingBox, GeometrySnapshot};
    use crate::member::MemberId;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn family() -> Vec<Member> {
        vec![
            Member::new(1, "a", 1),
            Member::new(2, "b", 1),
            Member::new(3, "c", 0).with_parents([1, 2]),
        ]
    }

    fn geometry() -> GeometrySnapshot {
        let mut geometry = GeometrySnapshot::new();
        geometry.insert_node(1, BoundingBox::new(0.0, 0.0, 100.0, 80.0));
        geometry.insert_node(2, BoundingBox::new(200.0, 0.0, 100.0, 80.0));
        geometry.insert_node(3, BoundingBox::new(100.0, 200.0, 100.0, 80.0));
        geometry
    }

    fn stabilizer() -> LayoutStabilizer {
        LayoutStabilizer::new(
            RetrySchedule::new(vec![ms(50), ms(150), ms(300)], ms(100)),
            RouterConfig::default(),
        )
    }

    #[test]
    fn runs_each_scheduled_pass() {
        let mut stab = stabilizer();
        let geometry = geometry();
        stab.members_changed(Duration::ZERO, &family());
        assert_eq!(stab.pending(), 3);
        assert!(stab.poll(ms(10), &geometry).is_none());
        assert_eq!(stab.next_due(), Some(ms(50)));
        assert_eq!(stab.poll(ms(50), &geometry).map(<[_]>::len), Some(2));
        assert_eq!(stab.pending(), 2);
        assert!(stab.poll(ms(400), &geometry).is_some());
        assert_eq!(stab.pending(), 0);
        assert_eq!(stab.passes_run(), 2);
    }

    #[test]
    fn late_geometry_is_picked_up_by_a_later_pass() {
        let mut stab = stabilizer();
        let mut geometry = geometry();
        let late = geometry.remove_node(&MemberId::from(3)).unwrap();
        stab.members_changed(Duration::ZERO, &family());
        assert_eq!(stab.poll(ms(50), &geometry).map(<[_]>::len), Some(0));
        geometry.insert_node(3, late);
        assert_eq!(stab.poll(ms(150), &geometry).map(<[_]>::len), Some(2));
    }

    #[test]
    fn newer_members_cancel_pending_passes() {
        let mut stab = stabilizer();
        let geometry = geometry();
        stab.members_changed(Duration::ZERO, &family());
        stab.viewport_resized(ms(10));
        assert_eq!(stab.pending(), 4);
        stab.members_changed(ms(20), &family()[..2]);
        assert_eq!(stab.pending(), 3);
        assert_eq!(stab.snapshot(), 2);
        assert_eq!(stab.next_due(), Some(ms(70)));
        assert!(stab.poll(ms(60), &geometry).is_none());
        assert_eq!(stab.poll(ms(70), &geometry).map(<[_]>::len), Some(0));
    }

    #[test]
    fn resize_schedules_one_pass() {
        let mut stab = stabilizer();
        let geometry = geometry();
        stab.members_changed(Duration::ZERO, &family());
        stab.flush(&geometry);
        stab.viewport_resized(ms(1000));
        assert_eq!(stab.pending(), 1);
        assert!(stab.poll(ms(1100), &geometry).is_some());
    }

    #[test]
    fn recomputation_is_idempotent() {
        let mut stab = stabilizer();
        let geometry = geometry();
        stab.members_changed(Duration::ZERO, &family());
        let first = stab.flush(&geometry).to_vec();
        let second = stab.flush(&geometry).to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn scheduling_near_the_end_of_time_saturates() {
        let mut stab = stabilizer();
        let geometry = geometry();
        stab.members_changed(Duration::MAX, &family());
        stab.viewport_resized(Duration::MAX);
        assert_eq!(stab.next_due(), Some(Duration::MAX));
        assert!(stab.poll(Duration::MAX, &geometry).is_some());
        assert_eq!(stab.pending(), 0);
    }

    #[test]
    fn settled_signal_needs_no_timers() {
        let mut stab = LayoutStabilizer::new(SettledSignal, RouterConfig::default());
        let geometry = geometry();
        stab.members_changed(Duration::ZERO, &family());
        stab.viewport_resized(ms(5));
        assert_eq!(stab.pending(), 0);
        stab.layout_settled(ms(30));
        assert_eq!(stab.poll(ms(30), &geometry).map(<[_]>::len), Some(2));
    }
}
