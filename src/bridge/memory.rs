use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{
    Cat, MediatedPair, MediationRequest, RuntimeError, RuntimeResult, SimRuntime, have_mediated,
};

#[derive(Default)]
struct SimState {
    mediators: Vec<Cat>,
    clan: Vec<Cat>,
    pairs: Vec<MediatedPair>,
    mediated_this_moon: HashSet<String>,
    settings: BTreeMap<String, bool>,
    moon: u32,
    reject_settings_writes: bool,
    calls: BTreeMap<&'static str, usize>,
}

/// In-process stand-in for the simulation runtime.
///
/// Mediation follows the clan rules: a mediator acts once per moon, a pair is
/// mediated at most once per moon, and the mediator cannot be one of the pair.
#[derive(Default)]
pub struct InMemorySim {
    state: Mutex<SimState>,
}

impl InMemorySim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mediators(self, cats: impl IntoIterator<Item = Cat>) -> Self {
        self.lock_state().mediators.extend(cats);
        self
    }

    pub fn with_clan(self, cats: impl IntoIterator<Item = Cat>) -> Self {
        self.lock_state().clan.extend(cats);
        self
    }

    pub fn with_setting(self, key: impl Into<String>, value: bool) -> Self {
        self.lock_state().settings.insert(key.into(), value);
        self
    }

    pub fn with_mediated_pair(self, pair: MediatedPair) -> Self {
        self.lock_state().pairs.push(pair);
        self
    }

    /// A small clan used by the demo mode of the binary.
    pub fn demo() -> Self {
        Self::new()
            .with_mediators([
                Cat::new("1", "Jayfeather", "mediator"),
                Cat::new("2", "Dovepaw", "mediator apprentice"),
            ])
            .with_clan([
                Cat::new("3", "Lionblaze", "warrior"),
                Cat::new("4", "Cinderheart", "warrior"),
                Cat::new("5", "Berrynose", "warrior"),
                Cat::new("6", "Poppyfrost", "warrior"),
                Cat::new("7", "Purdy", "elder"),
            ])
            .with_setting("disasters", false)
            .with_setting("deputy", true)
            .with_setting("retirement", false)
            .with_setting("affair", false)
            .with_setting("first cousin mates", false)
            .with_setting("autosave", true)
    }

    /// Start the next moon: the mediation ledger is cleared.
    pub fn advance_moon(&self) -> u32 {
        let mut state = self.lock_state();
        state.moon += 1;
        state.pairs.clear();
        state.mediated_this_moon.clear();
        state.moon
    }

    pub fn reject_settings_writes(&self, reject: bool) {
        self.lock_state().reject_settings_writes = reject;
    }

    pub fn settings_snapshot(&self) -> BTreeMap<String, bool> {
        self.lock_state().settings.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.lock_state().calls.get(method).copied().unwrap_or(0)
    }

    fn lock_state(&self) -> MutexGuard<'_, SimState> {
        // Poisoning only follows a panic in another caller; the ledger is
        // still coherent so keep serving it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, method: &'static str) -> MutexGuard<'_, SimState> {
        let mut state = self.lock_state();
        *state.calls.entry(method).or_default() += 1;
        state
    }
}

fn find_cat<'a>(cats: &'a [Cat], id: &str) -> Option<&'a Cat> {
    cats.iter().find(|cat| cat.id == id)
}

impl SimState {
    fn validate(&self, request: &MediationRequest) -> RuntimeResult<(Cat, Cat, Cat)> {
        let mediator = find_cat(&self.mediators, &request.mediator)
            .ok_or_else(|| RuntimeError::Rejected("That cat cannot mediate.".into()))?;
        if self.mediated_this_moon.contains(&mediator.id) {
            return Err(RuntimeError::Rejected(format!(
                "{} has already mediated this moon.",
                mediator.display_name()
            )));
        }
        if request.cat1 == request.cat2 {
            return Err(RuntimeError::Rejected(
                "Two different cats must be chosen.".into(),
            ));
        }
        if request.mediator == request.cat1 || request.mediator == request.cat2 {
            return Err(RuntimeError::Rejected(
                "A mediator cannot mediate their own relationship.".into(),
            ));
        }
        let first = find_cat(&self.clan, &request.cat1)
            .ok_or_else(|| RuntimeError::Rejected(format!("Unknown cat {}.", request.cat1)))?;
        let second = find_cat(&self.clan, &request.cat2)
            .ok_or_else(|| RuntimeError::Rejected(format!("Unknown cat {}.", request.cat2)))?;
        if have_mediated(&first.id, &second.id, &self.pairs) {
            return Err(RuntimeError::Rejected(
                "Pair has already been mediated this moon.".into(),
            ));
        }
        Ok((mediator.clone(), first.clone(), second.clone()))
    }
}

#[async_trait]
impl SimRuntime for InMemorySim {
    async fn get_possible_mediators(&self) -> RuntimeResult<Vec<Cat>> {
        let state = self.enter("getPossibleMediators");
        Ok(state
            .mediators
            .iter()
            .filter(|cat| !state.mediated_this_moon.contains(&cat.id))
            .cloned()
            .collect())
    }

    async fn get_possible_mediated(&self) -> RuntimeResult<Vec<Cat>> {
        Ok(self.enter("getPossibleMediated").clan.clone())
    }

    async fn get_mediated_pairs(&self) -> RuntimeResult<Vec<MediatedPair>> {
        Ok(self.enter("getMediatedPairs").pairs.clone())
    }

    async fn mediate(&self, request: MediationRequest) -> RuntimeResult<String> {
        let mut state = self.enter("mediate");
        let (mediator, first, second) = state.validate(&request)?;
        state
            .pairs
            .push(MediatedPair::new(first.id.clone(), second.id.clone()));
        state.mediated_this_moon.insert(mediator.id.clone());

        let mut text = if request.sabotage {
            format!(
                "{} quietly stirred up trouble between {} and {}.",
                mediator.display_name(),
                first.display_name(),
                second.display_name()
            )
        } else {
            format!(
                "{} helped {} and {} talk through their differences.",
                mediator.display_name(),
                first.display_name(),
                second.display_name()
            )
        };
        if request.allow_romantic {
            text.push_str(" Their romantic feelings may have shifted too.");
        }
        Ok(text)
    }

    async fn get_settings(&self) -> RuntimeResult<BTreeMap<String, bool>> {
        Ok(self.enter("getSettings").settings.clone())
    }

    async fn set_settings(&self, settings: BTreeMap<String, bool>) -> RuntimeResult<()> {
        let mut state = self.enter("setSettings");
        if state.reject_settings_writes {
            return Err(RuntimeError::Rejected("settings are read-only right now".into()));
        }
        state.settings = settings;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mediator: &str, a: &str, b: &str) -> MediationRequest {
        MediationRequest {
            mediator: mediator.into(),
            cat1: a.into(),
            cat2: b.into(),
            sabotage: false,
            allow_romantic: false,
        }
    }

    #[tokio::test]
    async fn mediation_records_pair_and_spends_mediator() {
        let sim = InMemorySim::demo();
        let text = sim.mediate(request("1", "3", "4")).await.unwrap();
        assert!(text.contains("Jayfeather"));

        let pairs = sim.get_mediated_pairs().await.unwrap();
        assert_eq!(pairs, vec![MediatedPair::new("3", "4")]);
        let mediators = sim.get_possible_mediators().await.unwrap();
        assert!(mediators.iter().all(|cat| cat.id != "1"));
    }

    #[tokio::test]
    async fn repeated_pair_is_rejected_in_either_order() {
        let sim = InMemorySim::demo();
        sim.mediate(request("1", "3", "4")).await.unwrap();
        let err = sim.mediate(request("2", "4", "3")).await.unwrap_err();
        assert_eq!(
            err,
            RuntimeError::Rejected("Pair has already been mediated this moon.".into())
        );
    }

    #[tokio::test]
    async fn new_moon_clears_ledger() {
        let sim = InMemorySim::demo();
        sim.mediate(request("1", "3", "4")).await.unwrap();
        assert_eq!(sim.advance_moon(), 1);
        assert!(sim.get_mediated_pairs().await.unwrap().is_empty());
        assert!(sim.mediate(request("1", "3", "4")).await.is_ok());
    }

    #[tokio::test]
    async fn mediator_cannot_be_a_subject() {
        let sim = InMemorySim::demo().with_clan([Cat::new("1", "Jayfeather", "mediator")]);
        let err = sim.mediate(request("1", "1", "3")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Rejected(_)));
    }

    #[tokio::test]
    async fn settings_writes_can_be_refused() {
        let sim = InMemorySim::demo();
        sim.reject_settings_writes(true);
        let err = sim.set_settings(BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Rejected(_)));
        assert_eq!(sim.call_count("setSettings"), 1);
        assert!(sim.settings_snapshot().contains_key("deputy"));
    }
}
