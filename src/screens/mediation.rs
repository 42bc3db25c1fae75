use std::sync::Arc;

use serde_json::json;

use super::picker::CatPicker;
use super::{Route, ScreenContext, ScreenPhase};
use crate::bridge::{
    Cat, MediatedPair, MediationKind, MediationRequest, RuntimeResult, SimRuntime, have_mediated,
};
use crate::document::DocumentHost;
use crate::error::{FrontError, Result};
use crate::logging::{LogLevel, TARGET_MEDIATION, emit, json_kv, json_str};
use crate::metrics;

pub const NO_MEDIATORS_NOTICE: &str = "No cats in the Clan can currently mediate. Cats with the \
\u{201c}mediator\u{201d} or \"mediator apprentice\" role without major injuries or illnesses can \
mediate once every moon.";

pub const MEDIATION_INTRO: &str = "Cats with the \u{201c}mediator\u{201d} or \"mediator \
apprentice\" role without major injuries or illnesses can mediate once every moon. Mediator cats \
cannot patrol. Roles can be set on a cat's edit page.";

pub const PAIR_RULE: &str = "Any particular pair of cats can only be mediated once per moon.";

pub const PAIR_ALREADY_MEDIATED: &str = "Pair has already been mediated this moon.";

pub const ALLOW_ROMANTIC_LABEL: &str = "Allow effects on romantic like, if possible";

/// Result of a mediate/sabotage attempt as seen by the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The runtime accepted; the narrative is on screen and the phase stays
    /// `InProgress` until "Mediate Again".
    Narrated(String),
    /// The runtime refused; the user was alerted and the screen reset.
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerSlot {
    Mediator,
    Subjects,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediationView {
    Loading,
    NoMediators,
    Ready(ReadyView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyView {
    pub mediator_candidates: Vec<Cat>,
    pub subject_candidates: Vec<Cat>,
    pub selected_mediator: Option<String>,
    pub selected_subjects: Vec<String>,
    pub pair: CurrentPair,
    pub allow_romantic: bool,
    pub narrative: String,
    /// Both pickers are disabled outside the `Start` phase.
    pub selection_enabled: bool,
    pub controls: MediationControls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPair {
    pub first: Option<Cat>,
    pub second: Option<Cat>,
    pub already_mediated: bool,
}

impl CurrentPair {
    pub fn indicator(&self) -> &'static str {
        if self.already_mediated { "X" } else { "\u{27f7}" }
    }

    pub fn status(&self) -> Option<&'static str> {
        self.already_mediated.then_some(PAIR_ALREADY_MEDIATED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediationControls {
    /// "Mediate" and "Sabotage", both enabled or both disabled.
    Start { actions_enabled: bool },
    /// "Mediate Again".
    InProgress,
}

/// Mediation screen: pick one mediator and two cats, then ask the runtime to
/// mediate (or sabotage) their relationship.
pub struct MediationController {
    runtime: Arc<dyn SimRuntime>,
    ctx: ScreenContext,
    possible_mediators: Vec<Cat>,
    possible_cats: Vec<Cat>,
    mediated_pairs: Vec<MediatedPair>,
    mediator_picker: CatPicker,
    subject_picker: CatPicker,
    allow_romantic: bool,
    narrative: String,
    phase: ScreenPhase,
    loaded: bool,
}

impl MediationController {
    pub fn new(runtime: Arc<dyn SimRuntime>, ctx: ScreenContext) -> Self {
        let per_page = ctx.cats_per_page;
        Self {
            runtime,
            ctx,
            possible_mediators: Vec::new(),
            possible_cats: Vec::new(),
            mediated_pairs: Vec::new(),
            mediator_picker: CatPicker::new(1, per_page),
            subject_picker: CatPicker::new(2, per_page),
            allow_romantic: false,
            narrative: String::new(),
            phase: ScreenPhase::Start,
            loaded: false,
        }
    }

    pub fn route(&self) -> Route {
        Route::Mediate
    }

    /// First display of the screen: title, then a full reset.
    pub async fn mount(&mut self, document: &mut dyn DocumentHost) {
        document.set_title(&self.ctx.page_title("Mediation"));
        self.reset().await;
    }

    /// Clear the selection, return to `Start` and refresh the candidate lists
    /// and the mediated-pairs snapshot.
    ///
    /// The three fetches run concurrently and are applied together once all
    /// have answered, so the lists always come from the same moment. A failed
    /// fetch leaves its list empty.
    pub async fn reset(&mut self) {
        self.mediator_picker.clear();
        self.subject_picker.clear();
        self.narrative.clear();
        self.phase = ScreenPhase::Start;

        let runtime = Arc::clone(&self.runtime);
        let (mediators, cats, pairs) = tokio::join!(
            runtime.get_possible_mediators(),
            runtime.get_possible_mediated(),
            runtime.get_mediated_pairs(),
        );

        self.possible_mediators = self.settle("getPossibleMediators", mediators);
        self.possible_cats = self.settle("getPossibleMediated", cats);
        self.mediated_pairs = self.settle("getMediatedPairs", pairs);
        self.loaded = true;

        emit(
            self.ctx.logger.as_ref(),
            LogLevel::Info,
            TARGET_MEDIATION,
            "screen_reset",
            [
                json_kv("mediators", json!(self.possible_mediators.len())),
                json_kv("cats", json!(self.possible_cats.len())),
                json_kv("mediated_pairs", json!(self.mediated_pairs.len())),
            ],
        );
    }

    fn settle<T>(&self, method: &str, result: RuntimeResult<Vec<T>>) -> Vec<T> {
        metrics::record(self.ctx.metrics.as_ref(), |m| m.record_fetch(result.is_ok()));
        match result {
            Ok(items) => items,
            Err(err) => {
                emit(
                    self.ctx.logger.as_ref(),
                    LogLevel::Warn,
                    TARGET_MEDIATION,
                    "fetch_failed",
                    [json_str("method", method), json_str("error", err.to_string())],
                );
                Vec::new()
            }
        }
    }

    pub fn phase(&self) -> ScreenPhase {
        self.phase
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn possible_mediators(&self) -> &[Cat] {
        &self.possible_mediators
    }

    pub fn possible_cats(&self) -> &[Cat] {
        &self.possible_cats
    }

    pub fn mediated_pairs(&self) -> &[MediatedPair] {
        &self.mediated_pairs
    }

    pub fn selected_mediator(&self) -> Option<&str> {
        self.mediator_picker
            .selected()
            .first()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn selected_subjects(&self) -> &[String] {
        self.subject_picker.selected()
    }

    fn selection_locked(&self, action: &str) -> bool {
        match self.phase {
            ScreenPhase::Start => false,
            ScreenPhase::InProgress => {
                emit(
                    self.ctx.logger.as_ref(),
                    LogLevel::Debug,
                    TARGET_MEDIATION,
                    "selection_ignored",
                    [json_str("action", action)],
                );
                true
            }
        }
    }

    /// Replace the mediator selection. Ignored while a mediation is shown.
    pub fn select_mediator(&mut self, id: &str) -> bool {
        if self.selection_locked("select_mediator") {
            return false;
        }
        self.mediator_picker.set_selected(vec![id.to_string()]);
        true
    }

    /// Replace the subject selection. Ignored while a mediation is shown.
    pub fn select_subjects(&mut self, ids: Vec<String>) -> bool {
        if self.selection_locked("select_subjects") {
            return false;
        }
        self.subject_picker.set_selected(ids);
        true
    }

    /// Picker-style toggle honouring the selection caps (1 mediator, 2 cats).
    pub fn toggle(&mut self, slot: PickerSlot, id: &str) -> bool {
        if self.selection_locked("toggle") {
            return false;
        }
        self.picker_mut(slot).toggle(id);
        true
    }

    pub fn picker(&self, slot: PickerSlot) -> &CatPicker {
        match slot {
            PickerSlot::Mediator => &self.mediator_picker,
            PickerSlot::Subjects => &self.subject_picker,
        }
    }

    fn picker_mut(&mut self, slot: PickerSlot) -> &mut CatPicker {
        match slot {
            PickerSlot::Mediator => &mut self.mediator_picker,
            PickerSlot::Subjects => &mut self.subject_picker,
        }
    }

    pub fn set_query(&mut self, slot: PickerSlot, query: &str) {
        self.picker_mut(slot).set_query(query);
    }

    pub fn next_page(&mut self, slot: PickerSlot) {
        let candidates = self.candidates(slot);
        self.picker_mut(slot).next_page(&candidates);
    }

    pub fn prev_page(&mut self, slot: PickerSlot) {
        self.picker_mut(slot).prev_page();
    }

    pub fn toggle_allow_romantic(&mut self) -> bool {
        self.allow_romantic = !self.allow_romantic;
        self.allow_romantic
    }

    pub fn allow_romantic(&self) -> bool {
        self.allow_romantic
    }

    /// Cats offered in a picker: mediators exclude the chosen pair, the pair
    /// excludes the chosen mediator.
    pub fn candidates(&self, slot: PickerSlot) -> Vec<Cat> {
        match slot {
            PickerSlot::Mediator => {
                let subjects = self.selected_subjects();
                self.possible_mediators
                    .iter()
                    .filter(|cat| !subjects.iter().any(|id| *id == cat.id))
                    .cloned()
                    .collect()
            }
            PickerSlot::Subjects => {
                let mediator = self.selected_mediator();
                self.possible_cats
                    .iter()
                    .filter(|cat| Some(cat.id.as_str()) != mediator)
                    .cloned()
                    .collect()
            }
        }
    }

    /// Whether the first two selected cats were already mediated this moon,
    /// in either order.
    pub fn already_mediated(&self) -> bool {
        match self.selected_subjects() {
            [first, second, ..] => have_mediated(first, second, &self.mediated_pairs),
            _ => false,
        }
    }

    fn eligibility(&self) -> std::result::Result<(String, String, String), String> {
        if self.phase != ScreenPhase::Start {
            return Err("a mediation is already being shown".into());
        }
        let mediator = self
            .selected_mediator()
            .ok_or_else(|| "choose a mediator".to_string())?;
        let (first, second) = match self.selected_subjects() {
            [first, second] => (first, second),
            _ => return Err("choose exactly two cats to mediate".into()),
        };
        if first == second {
            return Err("choose two different cats".into());
        }
        if mediator == first || mediator == second {
            return Err("the mediator cannot be one of the pair".into());
        }
        if self.already_mediated() {
            return Err(PAIR_ALREADY_MEDIATED.into());
        }
        Ok((mediator.to_string(), first.clone(), second.clone()))
    }

    /// True when "Mediate" and "Sabotage" are enabled.
    pub fn can_attempt(&self) -> bool {
        self.eligibility().is_ok()
    }

    /// Check preconditions and move to `InProgress` before anything is sent.
    pub fn begin_attempt(&mut self, kind: MediationKind) -> Result<MediationRequest> {
        let (mediator, cat1, cat2) = self.eligibility().map_err(FrontError::NotEligible)?;
        self.phase = ScreenPhase::InProgress;
        metrics::record(self.ctx.metrics.as_ref(), |m| m.record_attempt());
        emit(
            self.ctx.logger.as_ref(),
            LogLevel::Info,
            TARGET_MEDIATION,
            "attempt_started",
            [
                json_str("kind", kind.label()),
                json_str("mediator", mediator.clone()),
                json_str("cat1", cat1.clone()),
                json_str("cat2", cat2.clone()),
                json_kv("allow_romantic", self.allow_romantic),
            ],
        );
        Ok(MediationRequest {
            mediator,
            cat1,
            cat2,
            sabotage: kind.is_sabotage(),
            allow_romantic: self.allow_romantic,
        })
    }

    /// Apply the runtime's answer to an attempt started with
    /// [`Self::begin_attempt`].
    pub async fn complete_attempt(&mut self, result: RuntimeResult<String>) -> AttemptOutcome {
        match result {
            Ok(text) => {
                self.narrative = text.clone();
                emit(
                    self.ctx.logger.as_ref(),
                    LogLevel::Info,
                    TARGET_MEDIATION,
                    "attempt_narrated",
                    [json_kv("chars", json!(text.chars().count()))],
                );
                AttemptOutcome::Narrated(text)
            }
            Err(err) => {
                let message = err.to_string();
                metrics::record(self.ctx.metrics.as_ref(), |m| m.record_rejection());
                emit(
                    self.ctx.logger.as_ref(),
                    LogLevel::Warn,
                    TARGET_MEDIATION,
                    "attempt_rejected",
                    [json_str("error", message.clone())],
                );
                self.ctx.notifier.alert(&message);
                self.reset().await;
                AttemptOutcome::Rejected(message)
            }
        }
    }

    pub async fn attempt(&mut self, kind: MediationKind) -> Result<AttemptOutcome> {
        let request = self.begin_attempt(kind)?;
        let result = self.runtime.mediate(request).await;
        Ok(self.complete_attempt(result).await)
    }

    /// "Mediate Again": back to `Start` with fresh lists.
    pub async fn mediate_again(&mut self) {
        self.reset().await;
    }

    pub fn current_pair(&self) -> CurrentPair {
        let mut chosen = self
            .possible_cats
            .iter()
            .filter(|cat| self.subject_picker.is_selected(&cat.id))
            .cloned();
        CurrentPair {
            first: chosen.next(),
            second: chosen.next(),
            already_mediated: self.already_mediated(),
        }
    }

    pub fn view(&self) -> MediationView {
        if !self.loaded {
            return MediationView::Loading;
        }
        if self.possible_mediators.is_empty() {
            return MediationView::NoMediators;
        }

        let controls = match self.phase {
            ScreenPhase::Start => MediationControls::Start {
                actions_enabled: self.can_attempt(),
            },
            ScreenPhase::InProgress => MediationControls::InProgress,
        };
        let selection_enabled = match self.phase {
            ScreenPhase::Start => true,
            ScreenPhase::InProgress => false,
        };

        let mediator_candidates = self.candidates(PickerSlot::Mediator);
        let subject_candidates = self.candidates(PickerSlot::Subjects);
        MediationView::Ready(ReadyView {
            mediator_candidates: self
                .mediator_picker
                .current_page(&mediator_candidates)
                .into_iter()
                .cloned()
                .collect(),
            subject_candidates: self
                .subject_picker
                .current_page(&subject_candidates)
                .into_iter()
                .cloned()
                .collect(),
            selected_mediator: self.selected_mediator().map(str::to_string),
            selected_subjects: self.selected_subjects().to_vec(),
            pair: self.current_pair(),
            allow_romantic: self.allow_romantic,
            narrative: self.narrative.clone(),
            selection_enabled,
            controls,
        })
    }
}
