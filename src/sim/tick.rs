//! Per-frame orchestration
//!
//! [`Scale`] owns the whole simulation. External input is queued and applied
//! at the top of the next tick so a frame never sees half of a calculator
//! response. Each tick then runs due panel tasks, advances masses, beam, bowl
//! dips and panels, relayouts if needed, and hands one snapshot to the sink.

use serde::Deserialize;

use super::mass::Side;
use super::panel::{PanelEvent, PanelPhase, PanelUnit};
use super::schedule::{PanelTask, Scheduler};
use super::state::{FrameSnapshot, PanelSlot, RenderSink, ScaleEvent, SimulationState, TileSlot};
use crate::answers::{
    AnswerId, AnswerInput, AnswerSet, AnswerTile, CalculationResult, DropPayload, SelectionRule,
};
use crate::consts::*;
use crate::error::Rejection;
use crate::layout::{self, Layout, ViewportClass};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// One atomic bundle of external input
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExternalUpdate {
    /// Authoritative answer list, replacing the current tiles
    pub answers: Option<Vec<AnswerInput>>,
    /// Calculator response for the answers
    pub energies: Option<CalculationResult>,
    /// Explicit panel count; derived from the total energy when absent
    pub panel_target: Option<i64>,
}

/// The balance scale
#[derive(Debug, Clone)]
pub struct Scale {
    state: SimulationState,
    answers: AnswerSet,
    scheduler: Scheduler,
    inbox: Vec<ExternalUpdate>,
    events: Vec<ScaleEvent>,
    tuning: Tuning,
    settings: Settings,
    rule: SelectionRule,
    current_question: u32,
    viewport: ViewportClass,
    /// Latest authoritative panel count
    panel_target: usize,
    /// Latest calculator total; `None` while the answer set is newer
    authoritative_total: Option<f32>,
    layout: Layout,
    layout_dirty: bool,
    last_frame: FrameSnapshot,
}

impl Default for Scale {
    fn default() -> Self {
        Self::new(Tuning::default(), Settings::default())
    }
}

impl Scale {
    pub fn new(tuning: Tuning, settings: Settings) -> Self {
        Self {
            state: SimulationState::new(),
            answers: AnswerSet::new(),
            scheduler: Scheduler::new(),
            inbox: Vec::new(),
            events: Vec::new(),
            tuning,
            settings,
            rule: SelectionRule::default(),
            current_question: 0,
            viewport: ViewportClass::default(),
            panel_target: 0,
            authoritative_total: None,
            layout: Layout::default(),
            layout_dirty: false,
            last_frame: FrameSnapshot::default(),
        }
    }

    // === Accessors ===

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn tiles(&self) -> &[AnswerTile] {
        self.answers.tiles()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn last_frame(&self) -> &FrameSnapshot {
        &self.last_frame
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn panel_target(&self) -> usize {
        self.panel_target
    }

    pub fn current_question(&self) -> u32 {
        self.current_question
    }

    pub fn viewport(&self) -> ViewportClass {
        self.viewport
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Edge-triggered notifications since the last drain
    pub fn drain_events(&mut self) -> Vec<ScaleEvent> {
        std::mem::take(&mut self.events)
    }

    // === Configuration ===

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn set_selection_rule(&mut self, rule: SelectionRule) {
        self.rule = rule;
    }

    pub fn set_viewport(&mut self, viewport: ViewportClass) {
        if viewport != self.viewport {
            log::info!("Viewport {} -> {}", self.viewport.as_str(), viewport.as_str());
            self.viewport = viewport;
            self.layout_dirty = true;
        }
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.set_viewport(ViewportClass::from_width(width));
    }

    // === External input ===

    /// Queue an update; it takes effect at the start of the next tick
    pub fn submit(&mut self, update: ExternalUpdate) {
        self.inbox.push(update);
    }

    /// Override one side's mass target directly
    pub fn set_target(&mut self, side: Side, value: f32) {
        self.state.masses.set_target(side, value);
    }

    /// Retarget the number of panels in the left bowl
    ///
    /// Pending spawns and removals are dropped and the difference to the live
    /// panel count is rescheduled, staggered. Resending a target that is
    /// already on its way changes nothing. Clamped to `0..=MAX_PANELS`.
    pub fn set_panel_target(&mut self, target: i64) {
        if target > MAX_PANELS as i64 {
            log::warn!("Panel target {target} clamped to {MAX_PANELS}");
        }
        let target = target.clamp(0, MAX_PANELS as i64) as usize;
        if target == self.panel_target && self.projected_panel_count() == target {
            return;
        }
        self.panel_target = target;
        self.scheduler.cancel_all();

        if !self.settings.panel_drops_enabled() {
            self.resync_panels(target);
            return;
        }

        let live = self.state.live_panel_count();
        log::info!("Panel target {target} (live {live})");
        let t = &self.tuning;
        if target > live {
            for i in 0..target - live {
                self.scheduler
                    .schedule(t.reaction_delay + i as f32 * t.spawn_stagger, PanelTask::Spawn);
            }
        } else {
            for i in 0..live - target {
                self.scheduler
                    .schedule(t.reaction_delay + i as f32 * t.retire_stagger, PanelTask::Retire);
            }
        }
    }

    /// Live panels once every pending task has run
    fn projected_panel_count(&self) -> usize {
        let live = self.state.live_panel_count() + self.scheduler.pending_of(PanelTask::Spawn);
        live.saturating_sub(self.scheduler.pending_of(PanelTask::Retire))
    }

    /// Offer an answer for the current question (click or validated drop)
    pub fn offer_answer(&mut self, input: AnswerInput) -> Result<AnswerId, Rejection> {
        let question = self.current_question;
        if let Err(reason) = self.answers.check_offer(input.id, question, self.rule) {
            log::debug!("Answer {} rejected: {reason}", input.id);
            self.events.push(ScaleEvent::DropRejected(reason.clone()));
            return Err(reason);
        }

        let tile = AnswerTile::from_input(
            AnswerInput {
                question_index: question,
                ..input
            },
            question,
        );
        let id = tile.answer_id;
        log::debug!("Answer {id} added to question {question}");
        self.answers.push(tile.clone());
        self.authoritative_total = None;
        self.refresh_right_target();
        self.kick(Side::Right, self.tuning.answer_impulse);
        self.layout_dirty = true;
        self.events.push(ScaleEvent::AnswerAdded(tile));
        Ok(id)
    }

    /// Offer a serialized drag payload; malformed payloads change nothing
    pub fn offer_drop(&mut self, payload: &str) -> Result<AnswerId, Rejection> {
        match DropPayload::parse(payload) {
            Ok(drop) => self.offer_answer(drop.into_input(self.current_question)),
            Err(reason) => {
                log::warn!("Ignoring drop: {reason}");
                self.events.push(ScaleEvent::DropRejected(reason.clone()));
                Err(reason)
            }
        }
    }

    /// Ask the questionnaire to remove a tile of the current question
    pub fn request_removal(&mut self, id: AnswerId) -> Result<(), Rejection> {
        match self.answers.get(id, self.current_question) {
            Some(tile) if tile.removable => {
                self.events.push(ScaleEvent::RemovalRequested(id));
                Ok(())
            }
            _ => Err(Rejection::NotRemovable(id)),
        }
    }

    // === Context changes ===

    /// Drop every pending spawn/removal. Idempotent.
    pub fn cancel_pending(&mut self) {
        self.scheduler.cancel_all();
    }

    /// Navigate to another question
    ///
    /// Tiles persist; panels are resynchronized to the authoritative count
    /// without animation.
    pub fn change_question(&mut self, question: u32) {
        log::info!("Question {} -> {question}", self.current_question);
        self.current_question = question;
        self.scheduler.cancel_all();
        self.answers.refresh_removable(question);
        self.resync_panels(self.panel_target);
    }

    /// Start a new session: no answers, no panels, zero targets
    pub fn restart(&mut self) {
        log::info!("Scale restarted");
        self.scheduler.cancel_all();
        self.inbox.clear();
        self.answers.clear();
        self.authoritative_total = None;
        self.current_question = 0;
        self.panel_target = 0;
        self.state.panels.clear();
        self.state.recount_settled();
        self.state.masses.set_target(Side::Left, 0.0);
        self.state.masses.set_target(Side::Right, 0.0);
        self.layout_dirty = true;
    }

    /// Host component is going away
    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.inbox.clear();
        self.state.panels.clear();
        self.state.recount_settled();
        self.refresh_left_target();
        self.layout_dirty = true;
    }

    // === Tick ===

    /// Advance one frame of `dt` seconds and present it
    pub fn tick<S: RenderSink + ?Sized>(&mut self, dt: f32, sink: &mut S) {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 };

        self.flush_inbox();

        for task in self.scheduler.advance(dt) {
            self.run_task(task);
        }

        let tuning = &self.tuning;
        self.state.masses.advance(dt, tuning.mass_rate);
        let difference = self.state.masses.difference();

        // Springs are only stable for short steps
        let substeps = ((dt / SIM_DT).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        let h = dt / substeps as f32;
        for _ in 0..substeps {
            self.state.beam.advance(difference, h, tuning);
            self.state.left_dip.advance(h, tuning);
            self.state.right_dip.advance(h, tuning);
        }

        self.advance_panels(dt);

        if self.layout_dirty {
            self.layout = layout::layout(
                self.answers.tiles(),
                self.state.settled_panel_count,
                self.viewport,
            );
            self.layout_dirty = false;
        }

        self.state.time_ticks += 1;
        let frame = self.snapshot();
        sink.present(&frame);
        self.last_frame = frame;
    }

    fn flush_inbox(&mut self) {
        for update in std::mem::take(&mut self.inbox) {
            self.apply(update);
        }
    }

    fn apply(&mut self, update: ExternalUpdate) {
        let mut touched = false;

        if let Some(inputs) = update.answers {
            if self.answers.replace_all(inputs, self.current_question) {
                self.authoritative_total = None;
                touched = true;
            }
            self.layout_dirty = true;
        }

        let mut derived_panels = None;
        if let Some(calc) = update.energies {
            self.answers.apply_energies(&calc.per_answer);
            if calc.total_energy.is_finite() {
                let total = calc.total_energy.max(0.0);
                self.authoritative_total = Some(total);
                derived_panels = Some((total / PANEL_UNIT).round() as i64);
            }
            self.layout_dirty = true;
            touched = true;
        }

        self.refresh_right_target();
        if touched && !self.answers.is_empty() {
            self.kick(Side::Right, self.tuning.answer_impulse);
        }

        if let Some(target) = update.panel_target.or(derived_panels) {
            self.set_panel_target(target);
        }
    }

    fn run_task(&mut self, task: PanelTask) {
        match task {
            PanelTask::Spawn => {
                let id = self.state.next_panel_id();
                log::debug!("Panel {id} dropping");
                self.state.panels.push(PanelUnit::spawn(id, &self.tuning));
            }
            PanelTask::Retire => self.retire_one(),
        }
    }

    /// Fade out the newest panel, preferring one still in the air
    fn retire_one(&mut self) {
        let panels = &self.state.panels;
        let pick = panels
            .iter()
            .rposition(|p| p.is_in_flight())
            .or_else(|| panels.iter().rposition(|p| p.phase == PanelPhase::Settled));
        let Some(index) = pick else {
            return;
        };

        if self.state.panels[index].phase == PanelPhase::Settled {
            // Freeze it where the layout last drew it
            let rank = self.state.panels[..index]
                .iter()
                .filter(|p| p.phase == PanelPhase::Settled)
                .count();
            self.state.panels[index].position = layout::panel_slot(rank);
        }
        let unit = &mut self.state.panels[index];
        log::debug!("Panel {} fading out", unit.id);
        unit.begin_fade();

        self.state.recount_settled();
        self.refresh_left_target();
        self.layout_dirty = true;
    }

    fn advance_panels(&mut self, dt: f32) {
        let dips = self.settings.bowl_dips_enabled();
        let tuning = &self.tuning;
        let SimulationState {
            panels, left_dip, ..
        } = &mut self.state;

        let mut settled_any = false;
        let mut faded_any = false;
        for panel in panels.iter_mut() {
            let Some(event) = panel.advance(dt, tuning) else {
                continue;
            };
            let impulse = match event {
                PanelEvent::Landed => tuning.landing_impulse,
                PanelEvent::Settled => {
                    log::debug!("Panel {} settled", panel.id);
                    self.events.push(ScaleEvent::PanelSettled(panel.id));
                    settled_any = true;
                    tuning.settle_impulse
                }
                PanelEvent::Faded => {
                    self.events.push(ScaleEvent::PanelRemoved(panel.id));
                    faded_any = true;
                    tuning.removal_impulse
                }
            };
            if dips {
                left_dip.apply_impulse(impulse);
            }
        }

        if faded_any {
            panels.retain(|p| !(p.phase == PanelPhase::Fading && p.opacity <= 0.0));
        }
        if settled_any {
            self.state.recount_settled();
            self.refresh_left_target();
            self.layout_dirty = true;
        }
    }

    /// Replace all panels with `count` settled ones, no animation
    fn resync_panels(&mut self, count: usize) {
        self.state.panels.clear();
        for _ in 0..count {
            let id = self.state.next_panel_id();
            self.state.panels.push(PanelUnit::settled(id));
        }
        self.state.recount_settled();
        self.refresh_left_target();
        self.layout_dirty = true;
    }

    fn refresh_left_target(&mut self) {
        let mass = self.state.settled_panel_count as f32 * PANEL_UNIT * ENERGY_TO_MASS;
        self.state.masses.set_target(Side::Left, mass);
    }

    fn refresh_right_target(&mut self) {
        let energy = self
            .authoritative_total
            .unwrap_or_else(|| self.answers.total_energy());
        self.state
            .masses
            .set_target(Side::Right, energy * ENERGY_TO_MASS);
    }

    fn kick(&mut self, side: Side, impulse: f32) {
        if self.settings.bowl_dips_enabled() {
            self.state.dip_mut(side).apply_impulse(impulse);
        }
    }

    fn snapshot(&self) -> FrameSnapshot {
        let s = &self.state;

        let mut rank = 0;
        let left_slots = s
            .panels
            .iter()
            .map(|p| {
                let position = if p.phase == PanelPhase::Settled {
                    let slot = self
                        .layout
                        .panels
                        .get(rank)
                        .copied()
                        .unwrap_or_else(|| layout::panel_slot(rank));
                    rank += 1;
                    slot
                } else {
                    p.position
                };
                PanelSlot {
                    id: p.id,
                    position,
                    phase: p.phase,
                    opacity: p.opacity,
                }
            })
            .collect();

        let right_slots = self
            .answers
            .tiles()
            .iter()
            .filter_map(|t| self.layout.slot_of(t).map(|slot| TileSlot::new(t, *slot)))
            .collect();

        FrameSnapshot {
            tick: s.time_ticks,
            beam_angle: s.beam.angle,
            equilibrium_angle: super::beam::Beam::equilibrium(
                s.masses.difference(),
                &self.tuning,
            ),
            left_bowl_offset: s.left_dip.dip,
            right_bowl_offset: s.right_dip.dip,
            left_bowl: crate::bowl_anchor(s.beam.angle, Side::Left.sign(), s.left_dip.dip),
            right_bowl: crate::bowl_anchor(s.beam.angle, Side::Right.sign(), s.right_dip.dip),
            left_slots,
            right_slots,
            badges: self.layout.badges.clone(),
            settled_panel_count: s.settled_panel_count,
            left_mass: s.masses.left.current,
            right_mass: s.masses.right.current,
            show_energy_values: self.settings.show_energy_values,
            show_equilibrium: self.settings.show_equilibrium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const DT: f32 = 0.016;

    fn no_sink(_: &FrameSnapshot) {}

    fn run(scale: &mut Scale, ticks: usize) {
        for _ in 0..ticks {
            scale.tick(DT, &mut no_sink);
        }
    }

    fn run_at_60hz(scale: &mut Scale, ticks: usize) {
        for _ in 0..ticks {
            scale.tick(1.0 / 60.0, &mut no_sink);
        }
    }

    fn answer(id: AnswerId, q: u32, energy: Option<f32>) -> AnswerInput {
        AnswerInput {
            id,
            question_index: q,
            image_ref: None,
            energy,
            has_open_parameters: false,
        }
    }

    #[test]
    fn test_beam_tilts_right_then_back() {
        let mut scale = Scale::default();
        let max = scale.tuning().max_angle;

        scale.set_target(Side::Right, 100.0);
        run(&mut scale, 200);
        let after_first = scale.state().beam.angle;
        assert!(after_first > 0.0);
        assert!(after_first <= max);

        scale.set_target(Side::Left, 150.0);
        for _ in 0..200 {
            scale.tick(DT, &mut no_sink);
            assert!(scale.state().beam.angle.abs() <= max);
        }
        assert!(scale.state().beam.angle < after_first);

        run(&mut scale, 2000);
        assert!(scale.state().beam.angle < 0.0);
    }

    #[test]
    fn test_three_panels_settle_staggered() {
        let mut scale = Scale::default();
        scale.set_panel_target(3);
        assert_eq!(scale.pending_tasks(), 3);

        let mut first_seen: HashMap<u32, u64> = HashMap::new();
        let mut settled = 0;
        for _ in 0..600 {
            scale.tick(1.0 / 60.0, &mut no_sink);
            let state = scale.state();
            for p in &state.panels {
                first_seen.entry(p.id).or_insert(state.time_ticks);
            }
            let count = state.settled_panel_count;
            assert!(count == settled || count == settled + 1);
            settled = count;
            let on_rim = state
                .panels
                .iter()
                .filter(|p| p.phase == PanelPhase::Settled)
                .count();
            assert_eq!(count, on_rim);
        }

        assert_eq!(first_seen.len(), 3);
        let mut starts: Vec<u64> = first_seen.values().copied().collect();
        starts.sort_unstable();
        assert!(starts[1] > starts[0] && starts[2] > starts[1]);

        let state = scale.state();
        assert_eq!(state.settled_panel_count, 3);
        assert!(state.panels.iter().all(|p| p.phase == PanelPhase::Settled));
        let settled_events = scale
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, ScaleEvent::PanelSettled(_)))
            .count();
        assert_eq!(settled_events, 3);
    }

    #[test]
    fn test_negative_panel_target_clamps() {
        let mut scale = Scale::default();
        scale.set_panel_target(-4);
        assert_eq!(scale.panel_target(), 0);
        assert_eq!(scale.pending_tasks(), 0);
    }

    #[test]
    fn test_panel_removal_fades_newest() {
        let mut scale = Scale::default();
        scale.change_question(0);
        scale.set_panel_target(2);
        run(&mut scale, 300);
        assert_eq!(scale.state().settled_panel_count, 2);
        let newest = scale.state().panels[1].id;

        scale.set_panel_target(1);
        run(&mut scale, 300);
        let state = scale.state();
        assert_eq!(state.settled_panel_count, 1);
        assert_eq!(state.panels.len(), 1);
        assert!(state.panels.iter().all(|p| p.id != newest));
        assert!(
            scale
                .drain_events()
                .contains(&ScaleEvent::PanelRemoved(newest))
        );
    }

    #[test]
    fn test_retarget_mid_spawn_reschedules_difference() {
        let mut scale = Scale::default();
        scale.set_panel_target(3);
        // First spawn fires at 1.5 s
        run(&mut scale, 100);
        assert_eq!(scale.state().live_panel_count(), 1);

        scale.set_panel_target(5);
        assert_eq!(scale.pending_tasks(), 4);
        run(&mut scale, 600);
        assert_eq!(scale.state().settled_panel_count, 5);
    }

    #[test]
    fn test_cancel_pending_is_idempotent() {
        let mut once = Scale::default();
        once.set_panel_target(4);
        run(&mut once, 100);
        let mut twice = once.clone();

        once.cancel_pending();
        twice.cancel_pending();
        twice.cancel_pending();
        assert_eq!(once.pending_tasks(), 0);
        assert_eq!(twice.pending_tasks(), 0);

        run(&mut once, 120);
        run(&mut twice, 120);
        assert_eq!(once.state(), twice.state());
        assert_eq!(once.last_frame(), twice.last_frame());
    }

    #[test]
    fn test_question_change_resyncs_panels() {
        let mut scale = Scale::default();
        scale.set_panel_target(4);
        run(&mut scale, 100);
        assert!(scale.state().panels.iter().any(|p| p.is_in_flight()));

        scale.change_question(1);
        assert_eq!(scale.pending_tasks(), 0);
        let state = scale.state();
        assert_eq!(state.panels.len(), 4);
        assert_eq!(state.settled_panel_count, 4);
        assert!(state.panels.iter().all(|p| p.phase == PanelPhase::Settled));
    }

    #[test]
    fn test_calculation_applies_atomically() {
        let mut scale = Scale::default();
        scale.submit(ExternalUpdate {
            answers: Some(vec![answer(1, 0, None), answer(2, 0, None)]),
            ..Default::default()
        });
        scale.submit(ExternalUpdate {
            energies: Some(CalculationResult {
                total_energy: 30.0,
                per_answer: HashMap::from([(1, 10.0), (2, 20.0)]),
            }),
            ..Default::default()
        });
        // Nothing changes until the tick
        assert!(scale.tiles().is_empty());

        let mut seen = Vec::new();
        scale.tick(DT, &mut |f: &FrameSnapshot| {
            seen.push(f.right_slots.iter().map(|t| t.energy_value).collect::<Vec<_>>());
        });
        assert_eq!(scale.tiles().len(), 2);
        assert_eq!(scale.state().masses.right.target, 30.0 * ENERGY_TO_MASS);
        assert_eq!(scale.panel_target(), 3);
        assert_eq!(scale.pending_tasks(), 3);
        // Both tiles share question 0, so one is drawn with a badge
        assert_eq!(seen, vec![vec![10.0]]);
        assert_eq!(scale.last_frame().badges[0].count, 2);
    }

    #[test]
    fn test_default_energy_then_authoritative() {
        let mut scale = Scale::default();
        scale.submit(ExternalUpdate {
            answers: Some(vec![answer(1, 0, None)]),
            ..Default::default()
        });
        run(&mut scale, 1);
        assert_eq!(
            scale.state().masses.right.target,
            DEFAULT_ENERGY * ENERGY_TO_MASS
        );

        let before = scale.state().masses.right.current;
        scale.submit(ExternalUpdate {
            energies: Some(CalculationResult {
                total_energy: 50.0,
                per_answer: HashMap::from([(1, 50.0)]),
            }),
            ..Default::default()
        });
        run(&mut scale, 1);
        let after = scale.state().masses.right.current;
        // Tweened, not jumped
        assert!(after - before < 50.0 * ENERGY_TO_MASS * 0.1);
        assert!(!scale.tiles()[0].energy_is_default);
    }

    #[test]
    fn test_offer_and_reject_drops() {
        let mut scale = Scale::default();
        scale.set_selection_rule(SelectionRule { max_answers: 2 });

        assert_eq!(scale.offer_drop(r#"{"id": 5, "image": "car.png"}"#), Ok(5));
        assert_eq!(
            scale.offer_drop(r#"{"id": 5}"#),
            Err(Rejection::Duplicate(5))
        );
        assert!(matches!(
            scale.offer_drop("{oops"),
            Err(Rejection::Malformed(_))
        ));
        assert_eq!(scale.offer_drop(r#"{"id": 6}"#), Ok(6));
        assert_eq!(
            scale.offer_drop(r#"{"id": 7}"#),
            Err(Rejection::Capacity { question: 0, max: 2 })
        );
        assert_eq!(scale.tiles().len(), 2);

        let events = scale.drain_events();
        let added = events
            .iter()
            .filter(|e| matches!(e, ScaleEvent::AnswerAdded(_)))
            .count();
        let rejected = events
            .iter()
            .filter(|e| matches!(e, ScaleEvent::DropRejected(_)))
            .count();
        assert_eq!((added, rejected), (2, 3));
        assert!(scale.drain_events().is_empty());
    }

    #[test]
    fn test_malformed_drop_changes_nothing() {
        let mut scale = Scale::default();
        run(&mut scale, 5);
        let before = scale.state().clone();
        let _ = scale.offer_drop(r#"{"name": "no id"}"#);
        assert_eq!(scale.state(), &before);
        assert!(scale.tiles().is_empty());
    }

    #[test]
    fn test_removal_request_only_for_current_question() {
        let mut scale = Scale::default();
        scale.offer_answer(answer(1, 0, Some(4.0))).unwrap();
        scale.change_question(1);
        scale.offer_answer(answer(2, 1, Some(4.0))).unwrap();
        scale.drain_events();

        assert_eq!(scale.request_removal(1), Err(Rejection::NotRemovable(1)));
        assert_eq!(scale.request_removal(2), Ok(()));
        assert_eq!(scale.drain_events(), vec![ScaleEvent::RemovalRequested(2)]);
        // The core does not delete the tile itself
        assert_eq!(scale.tiles().len(), 2);
    }

    #[test]
    fn test_viewport_change_relayouts_without_physics_reset() {
        let mut scale = Scale::default();
        scale.offer_answer(answer(1, 0, Some(20.0))).unwrap();
        run(&mut scale, 60);
        let angle = scale.state().beam.angle;
        let wide = scale.layout().slot(1).unwrap().position;

        scale.set_viewport_width(400.0);
        assert_eq!(scale.viewport(), ViewportClass::Narrow);
        scale.tick(0.0, &mut no_sink);
        assert_eq!(scale.state().beam.angle, angle);
        assert_ne!(scale.layout().slot(1).unwrap().position, wide);
    }

    #[test]
    fn test_restart_clears_everything() {
        let mut scale = Scale::default();
        scale.offer_answer(answer(1, 0, Some(20.0))).unwrap();
        scale.set_panel_target(2);
        run(&mut scale, 400);

        scale.restart();
        run(&mut scale, 1);
        assert!(scale.tiles().is_empty());
        assert!(scale.state().panels.is_empty());
        assert_eq!(scale.pending_tasks(), 0);
        assert!(scale.last_frame().right_slots.is_empty());
        assert_eq!(scale.state().masses.right.target, 0.0);
    }

    #[test]
    fn test_reduced_motion_places_panels_immediately() {
        let mut scale = Scale::new(
            Tuning::default(),
            Settings {
                reduced_motion: true,
                ..Settings::default()
            },
        );
        scale.set_panel_target(3);
        assert_eq!(scale.state().settled_panel_count, 3);
        scale.offer_answer(answer(1, 0, None)).unwrap();
        run(&mut scale, 10);
        assert_eq!(scale.state().right_dip.dip, 0.0);
    }

    #[test]
    fn test_snapshot_bowls_follow_beam() {
        let mut scale = Scale::default();
        scale.set_target(Side::Right, 300.0);
        run(&mut scale, 300);
        let frame = scale.last_frame();
        assert!(frame.beam_angle > 0.0);
        // Right bowl sinks, left bowl rises
        assert!(frame.right_bowl.y > PIVOT_Y);
        assert!(frame.left_bowl.y < PIVOT_Y);
        assert_eq!(frame.tick, 300);
    }

    #[test]
    fn test_huge_dt_is_clamped() {
        let mut scale = Scale::default();
        scale.set_target(Side::Right, 1.0e6);
        scale.offer_answer(answer(1, 0, None)).unwrap();
        for _ in 0..100 {
            scale.tick(10.0, &mut no_sink);
            assert!(scale.state().beam.angle.abs() <= scale.tuning().max_angle);
            assert!(scale.state().right_dip.dip.abs() < 50.0);
        }
        scale.tick(f32::NAN, &mut no_sink);
        assert!(scale.state().beam.angle.is_finite());
    }

    #[test]
    fn test_slow_host_keeps_bowls_bounded() {
        let mut scale = Scale::default();
        scale.offer_answer(answer(1, 0, Some(5.0))).unwrap();
        scale.set_panel_target(2);
        for _ in 0..60 {
            scale.tick(MAX_DT, &mut no_sink);
            let frame = scale.last_frame();
            assert!(frame.right_bowl_offset.abs() < 50.0, "{}", frame.right_bowl_offset);
            assert!(frame.left_bowl_offset.abs() < 50.0, "{}", frame.left_bowl_offset);
        }
        assert!(scale.state().right_dip.dip.abs() < 1.0);
        assert_eq!(scale.state().settled_panel_count, 2);
    }

    #[test]
    fn test_resent_panel_target_still_lands() {
        let mut scale = Scale::default();
        for second in 0..10 {
            scale.set_panel_target(3);
            if second > 0 {
                assert_eq!(
                    scale.state().live_panel_count() + scale.pending_tasks(),
                    3
                );
            }
            run_at_60hz(&mut scale, 60);
        }
        assert_eq!(scale.state().live_panel_count(), 3);
        assert_eq!(scale.state().settled_panel_count, 3);
    }

    #[test]
    fn test_repeated_calculation_does_not_delay_panels() {
        let mut scale = Scale::default();
        scale.offer_answer(answer(1, 0, None)).unwrap();
        for _ in 0..8 {
            scale.submit(ExternalUpdate {
                energies: Some(CalculationResult {
                    total_energy: 20.0,
                    per_answer: HashMap::from([(1, 20.0)]),
                }),
                ..Default::default()
            });
            run_at_60hz(&mut scale, 60);
        }
        assert_eq!(scale.panel_target(), 2);
        assert_eq!(scale.state().settled_panel_count, 2);
    }

    #[test]
    fn test_absurd_energy_caps_panel_target() {
        let mut scale = Scale::default();
        scale.submit(ExternalUpdate {
            energies: Some(CalculationResult {
                total_energy: 1.0e30,
                per_answer: HashMap::new(),
            }),
            ..Default::default()
        });
        scale.tick(DT, &mut no_sink);
        assert_eq!(scale.panel_target(), MAX_PANELS);
        assert_eq!(scale.pending_tasks(), MAX_PANELS);

        scale.set_panel_target(i64::MAX);
        assert_eq!(scale.panel_target(), MAX_PANELS);
        scale.change_question(1);
        assert_eq!(scale.state().settled_panel_count, MAX_PANELS);
    }

    #[test]
    fn test_snapshot_carries_display_preferences() {
        let mut scale = Scale::new(
            Tuning::default(),
            Settings {
                show_energy_values: false,
                show_equilibrium: true,
                ..Settings::default()
            },
        );
        scale.tick(DT, &mut no_sink);
        assert!(!scale.last_frame().show_energy_values);
        assert!(scale.last_frame().show_equilibrium);

        scale.set_settings(Settings::default());
        scale.tick(DT, &mut no_sink);
        assert!(scale.last_frame().show_energy_values);
    }
}
