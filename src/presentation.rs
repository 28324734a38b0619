//! Presentation mode: cycles through generations and fits the active row
//! into the viewport.
//!
//! # Invariants
//!
//! 1. `active_index` is always in `[0, N-1]`, or `0` when there are no
//!    generations.
//! 2. Manual `next`/`previous` clamp and pause; auto-advance wraps.
//! 3. The auto-advance timer is armed only while presenting, unpaused and
//!    with more than one generation.
//! 4. Leaving presentation mode resets to the initial state synchronously.
//!
//! Time is supplied by the caller through [`Navigator::tick`], so the state
//! machine is deterministic and needs no clock of its own.

use serde::Serialize;
use std::time::Duration;

use crate::config::PresentationConfig;
use crate::geometry::{BoundingBox, GeometryProvider, NodeRef, ViewportBox};

/// Which tree variant the host is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Tree,
    Presentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub scale: f32,
    pub translate_y: f32,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            translate_y: 0.0,
        }
    }

    /// CSS-style transform string with a top-centre origin.
    pub fn to_css(&self) -> String {
        format!("translateY({:.2}px) scale({:.4})", self.translate_y, self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationState {
    pub active_index: usize,
    pub is_paused: bool,
    pub transform: Transform,
}

impl Default for PresentationState {
    fn default() -> Self {
        Self {
            active_index: 0,
            is_paused: false,
            transform: Transform::identity(),
        }
    }
}

/// Actions a control surface can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Advance,
    Previous,
    Next,
    TogglePause,
    Reset,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    generations: Vec<i64>,
    config: PresentationConfig,
    state: PresentationState,
    mode: ViewMode,
    /// Time accumulated towards the next auto-advance; `None` when disarmed.
    timer: Option<Duration>,
}

impl Navigator {
    /// Starts presenting `generations` (already sorted, oldest first).
    pub fn new(generations: Vec<i64>, config: PresentationConfig) -> Self {
        let mut navigator = Self {
            generations,
            config,
            state: PresentationState::default(),
            mode: ViewMode::Presentation,
            timer: None,
        };
        navigator.sync_timer();
        navigator
    }

    pub fn state(&self) -> PresentationState {
        self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn generation_count(&self) -> usize {
        self.generations.len()
    }

    /// Generation key being shown, `None` when idle.
    pub fn current_generation(&self) -> Option<i64> {
        if self.mode != ViewMode::Presentation {
            return None;
        }
        self.generations.get(self.state.active_index).copied()
    }

    pub fn is_idle(&self) -> bool {
        self.mode != ViewMode::Presentation || self.generations.is_empty()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        if mode == ViewMode::Tree {
            self.reset();
        }
        tracing::debug!(?mode, "view mode changed");
        self.sync_timer();
    }

    /// Replaces the generation list, keeping the active index in range, and
    /// refits when the generation on show changed.
    pub fn set_generations(&mut self, generations: Vec<i64>, geometry: &dyn GeometryProvider) {
        let shown = self.current_generation();
        let count_changed = generations.len() != self.generations.len();
        self.generations = generations;
        self.state.active_index = self.clamp_index(self.state.active_index);
        if count_changed {
            // A new generation count restarts the interval.
            self.timer = None;
        }
        self.sync_timer();
        if self.current_generation() != shown {
            self.refit(geometry);
        }
    }

    /// Cyclic step taken by the timer. Returns whether the index changed.
    pub fn advance(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        let next = (self.state.active_index + 1) % self.generations.len();
        self.set_index(next)
    }

    pub fn previous(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.set_paused(true);
        self.set_index(self.state.active_index.saturating_sub(1))
    }

    pub fn next(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.set_paused(true);
        let last = self.generations.len() - 1;
        self.set_index((self.state.active_index + 1).min(last))
    }

    pub fn toggle_pause(&mut self) {
        if self.is_idle() {
            return;
        }
        self.set_paused(!self.state.is_paused);
    }

    pub fn reset(&mut self) {
        self.state = PresentationState::default();
        self.timer = None;
        self.sync_timer();
    }

    /// Applies `action`; returns whether the active index changed.
    pub fn apply(&mut self, action: NavAction) -> bool {
        match action {
            NavAction::Advance => self.advance(),
            NavAction::Previous => self.previous(),
            NavAction::Next => self.next(),
            NavAction::TogglePause => {
                self.toggle_pause();
                false
            }
            NavAction::Reset => {
                let moved = self.state.active_index != 0;
                self.reset();
                moved
            }
        }
    }

    /// Applies `action` and refits when the active generation moved.
    pub fn step(&mut self, action: NavAction, geometry: &dyn GeometryProvider) -> bool {
        let moved = self.apply(action);
        if moved {
            self.refit(geometry);
        }
        moved
    }

    /// Feeds elapsed time to the auto-advance timer and refits after any
    /// advance. Returns how many advances fired.
    pub fn tick(&mut self, elapsed: Duration, geometry: &dyn GeometryProvider) -> usize {
        let Some(accumulated) = self.timer else {
            return 0;
        };
        let accumulated = accumulated.saturating_add(elapsed);
        let interval = self.config.auto_play_interval().as_nanos();
        let due = accumulated.as_nanos() / interval;
        let remainder = accumulated.as_nanos() % interval;
        self.timer = Some(Duration::new(
            u64::try_from(remainder / 1_000_000_000).unwrap_or(u64::MAX),
            (remainder % 1_000_000_000) as u32,
        ));
        if due == 0 {
            return 0;
        }
        // Whole laps leave the index where it was.
        let steps = due % self.generations.len().max(1) as u128;
        for _ in 0..steps {
            self.advance();
        }
        if steps > 0 {
            self.refit(geometry);
        }
        usize::try_from(due).unwrap_or(usize::MAX)
    }

    /// Recomputes the transform from current geometry.
    ///
    /// Leaves the transform untouched and returns `false` when the active row
    /// or the viewport cannot be measured yet.
    pub fn refit(&mut self, geometry: &dyn GeometryProvider) -> bool {
        let Some(generation) = self.current_generation() else {
            return false;
        };
        let Some(row) = geometry.bounding_box_of(NodeRef::GenerationRow(generation)) else {
            tracing::debug!(generation, "active row not measured yet, keeping transform");
            return false;
        };
        let Some(viewport) = geometry.viewport_box() else {
            return false;
        };
        match fit_transform(&row, &viewport, &self.config) {
            Some(transform) => {
                self.state.transform = transform;
                true
            }
            None => false,
        }
    }

    fn set_index(&mut self, index: usize) -> bool {
        let index = self.clamp_index(index);
        if index == self.state.active_index {
            return false;
        }
        self.state.active_index = index;
        tracing::trace!(index, "active generation changed");
        true
    }

    fn set_paused(&mut self, paused: bool) {
        if self.state.is_paused != paused {
            self.state.is_paused = paused;
            self.timer = None;
        }
        self.sync_timer();
    }

    fn clamp_index(&self, index: usize) -> usize {
        index.min(self.generations.len().saturating_sub(1))
    }

    fn sync_timer(&mut self) {
        let should_run =
            self.mode == ViewMode::Presentation && !self.state.is_paused && self.generations.len() > 1;
        match (should_run, self.timer.is_some()) {
            (true, false) => self.timer = Some(Duration::ZERO),
            (false, true) => self.timer = None,
            _ => {}
        }
    }
}

/// Scale and vertical offset that centre `row` in the usable part of
/// `viewport` (the viewport minus header and footer chrome).
///
/// Both boxes share one frame whose origin is the untransformed content
/// origin; the scale is applied about the content's top edge.
pub fn fit_transform(row: &BoundingBox, viewport: &ViewportBox, config: &PresentationConfig) -> Option<Transform> {
    let usable_top = viewport.top + config.header_height;
    let usable_height = viewport.height - config.header_height - config.footer_height;
    let usable_width = viewport.width;
    if !row.is_finite() || usable_height <= 0.0 || usable_width <= 0.0 {
        return None;
    }
    if row.width() <= 0.0 || row.height() <= 0.0 {
        return None;
    }
    let padding = config.fit_padding.clamp(0.05, 1.0);
    let width_ratio = usable_width * padding / row.width();
    let height_ratio = usable_height * padding / row.height();
    let scale = width_ratio
        .min(height_ratio)
        .min(config.max_scale)
        .max(config.min_scale);
    let translate_y = usable_top + usable_height / 2.0 - row.center_y() * scale;
    Some(Transform { scale, translate_y })
}
