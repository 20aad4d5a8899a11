//! Program wizard - step-by-step exercise selection for every program variant
//!
//! The wizard walks a [`ProgramTemplate`] day by day and step by step. Each step
//! collects a fixed number of picks, either from the catalog keyboard or typed in
//! as a custom exercise. When the last interactive day is done, derived days are
//! copied, every step is checked against its required count and the program is
//! written to the store. Nothing is saved if a check fails.
//!
//! The wizard never talks to Telegram: every call returns an [`Outcome`] that the
//! bot turns into messages.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::db::{DayEntry, ProgramBody, ProgramStore, SavedProgram};
use crate::error::{CUSTOM_NAME_LIMIT, WizardError, WizardResult};
use crate::keyboard::{Choice, Prompt, PromptContext, day_suffix, render_prompt};
use crate::template::{
    DaySource, ExclusionScope, FlatStep, ProgramKind, ProgramTemplate, ResultShape,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    ChoosingExercise,
    /// Waiting for free text; remembers the prompt message to delete afterwards
    EnteringCustomExercise { prompt_message: Option<i32> },
}

/// One recorded exercise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    /// Index into the day's flattened steps
    pub step: usize,
    pub subgroup: &'static str,
    pub exercise: String,
}

impl Pick {
    pub fn entry(&self) -> String {
        format!("{}: {}", self.subgroup, self.exercise)
    }
}

/// Per-user state of one wizard run
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub kind: ProgramKind,
    pub user_id: i64,
    /// 1-based
    pub day: usize,
    pub step: usize,
    pub current: Option<FlatStep>,
    pub pending: Vec<String>,
    /// Picks per day plan, derived days included once filled
    pub picks: Vec<Vec<Pick>>,
    pub used: HashSet<String>,
    pub tokens: HashMap<String, Choice>,
    pub run: u32,
    pub generation: u32,
    pub mode: Mode,
}

/// Run ids grow with wall time, plus a counter for runs started within the same second
fn next_run() -> u32 {
    static STARTED: AtomicU32 = AtomicU32::new(0);
    let seq = STARTED.fetch_add(1, Ordering::Relaxed);
    (Utc::now().timestamp() as u32).wrapping_add(seq)
}

impl ConversationState {
    fn new(kind: ProgramKind, user_id: i64, template: &ProgramTemplate) -> Self {
        let first = template.first_interactive_day().unwrap_or(0);
        Self {
            kind,
            user_id,
            day: first + 1,
            step: 0,
            current: None,
            pending: Vec::new(),
            picks: vec![Vec::new(); template.days.len()],
            used: HashSet::new(),
            tokens: HashMap::new(),
            run: next_run(),
            generation: 0,
            mode: Mode::ChoosingExercise,
        }
    }

    pub fn custom_prompt_message(&self) -> Option<i32> {
        match self.mode {
            Mode::EnteringCustomExercise { prompt_message } => prompt_message,
            Mode::ChoosingExercise => None,
        }
    }

    pub fn is_entering_custom(&self) -> bool {
        matches!(self.mode, Mode::EnteringCustomExercise { .. })
    }
}

/// Request for a typed exercise name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRequest {
    pub subgroup: &'static str,
    pub day: Option<usize>,
}

impl CustomRequest {
    pub fn text(&self) -> String {
        format!(
            "✍️ <b>Введите свое упражнение для {}{}</b>\n\
            Напишите название (например, 'Жим ногами в тренажере'):",
            self.subgroup,
            day_suffix(self.day)
        )
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// Show (or replace) the current step's keyboard
    Prompt(Prompt),
    AwaitingCustom(CustomRequest),
    Completed(SavedProgram),
}

pub struct Wizard<'a> {
    catalog: &'a Catalog,
    store: &'a dyn ProgramStore,
}

impl<'a> Wizard<'a> {
    pub fn new(catalog: &'a Catalog, store: &'a dyn ProgramStore) -> Self {
        Self { catalog, store }
    }

    /// Fresh run for `kind`; the caller drops whatever state the user had before
    pub fn start(&self, kind: ProgramKind, user_id: i64) -> WizardResult<(ConversationState, Outcome)> {
        let template = kind.template();
        let mut state = ConversationState::new(kind, user_id, &template);
        info!("Starting {} for user {}", template.label, user_id);
        let outcome = self.advance(&mut state, &template)?;
        Ok((state, outcome))
    }

    /// Handle a keyboard press: a listed exercise or the custom-entry button
    pub fn select(
        &self,
        state: &mut ConversationState,
        token: &str,
        prompt_message: Option<i32>,
    ) -> WizardResult<Outcome> {
        let choice = state
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| WizardError::UnknownToken(token.to_string()))?;
        debug!("User {} pressed {} -> {:?}", state.user_id, token, choice);

        let current = state.current.map(|s| s.subgroup);
        let matches_step = match &choice {
            Choice::Exercise { subgroup, day, .. } => Some(*subgroup) == current && *day == state.day,
            Choice::Custom { day } => *day == state.day,
        };
        if !matches_step {
            warn!("Token {} of user {} does not belong to the current step", token, state.user_id);
            return Err(WizardError::UnknownToken(token.to_string()));
        }

        match choice {
            Choice::Exercise { exercise, .. } => self.record(state, exercise),
            Choice::Custom { .. } => self.begin_custom(state, token, prompt_message),
        }
    }

    pub fn begin_custom(
        &self,
        state: &mut ConversationState,
        token: &str,
        prompt_message: Option<i32>,
    ) -> WizardResult<Outcome> {
        if !matches!(state.tokens.get(token), Some(Choice::Custom { .. })) {
            return Err(WizardError::UnknownToken(token.to_string()));
        }
        let step = state.current.ok_or(WizardError::NoActiveStep)?;
        if state.pending.len() >= step.required {
            return Err(WizardError::StepSaturated {
                subgroup: step.subgroup.to_string(),
                required: step.required,
            });
        }

        state.mode = Mode::EnteringCustomExercise { prompt_message };
        state.tokens.clear();
        Ok(Outcome::AwaitingCustom(CustomRequest {
            subgroup: step.subgroup,
            day: self.shown_day(state),
        }))
    }

    /// Typed exercise name; counts exactly like a keyboard pick
    pub fn submit_custom(&self, state: &mut ConversationState, text: &str) -> WizardResult<Outcome> {
        if !state.is_entering_custom() {
            return Err(WizardError::NotEnteringCustom);
        }
        let name = text.trim();
        if name.is_empty() || name.chars().count() > CUSTOM_NAME_LIMIT {
            return Err(WizardError::InvalidCustomName);
        }
        debug!("User {} added custom exercise: {}", state.user_id, name);

        let previous = std::mem::replace(&mut state.mode, Mode::ChoosingExercise);
        match self.record(state, name.to_string()) {
            Err(e) if e.is_user_error() => {
                state.mode = previous;
                Err(e)
            }
            other => other,
        }
    }

    /// Leave custom entry and show the current step again, unchanged
    pub fn cancel_custom(&self, state: &mut ConversationState) -> WizardResult<Outcome> {
        if !state.is_entering_custom() {
            return Err(WizardError::NotEnteringCustom);
        }
        let step = state.current.ok_or(WizardError::NoActiveStep)?;
        state.mode = Mode::ChoosingExercise;
        self.render(state, step).map(Outcome::Prompt)
    }

    /// Delete the user's saved program; `false` if there was none
    pub fn clear(&self, user_id: i64) -> WizardResult<bool> {
        let removed = self.store.delete(user_id)?;
        if removed {
            self.store.flush()?;
            info!("Program removed for user {}", user_id);
        }
        Ok(removed)
    }

    fn shown_day(&self, state: &ConversationState) -> Option<usize> {
        state.kind.template().is_multi_day().then_some(state.day)
    }

    fn record(&self, state: &mut ConversationState, exercise: String) -> WizardResult<Outcome> {
        let step = state.current.ok_or(WizardError::NoActiveStep)?;
        if state.pending.len() >= step.required {
            return Err(WizardError::StepSaturated {
                subgroup: step.subgroup.to_string(),
                required: step.required,
            });
        }
        if state.pending.contains(&exercise) {
            return Err(WizardError::DuplicatePick {
                subgroup: step.subgroup.to_string(),
                exercise,
            });
        }

        state.pending.push(exercise.clone());
        state.used.insert(exercise.clone());
        let pick = Pick { step: state.step, subgroup: step.subgroup, exercise };
        info!(
            "User {} picked '{}' (day {}, {}/{})",
            state.user_id,
            pick.entry(),
            state.day,
            state.pending.len(),
            step.required
        );
        state.picks[state.day - 1].push(pick);

        if state.pending.len() >= step.required {
            state.step += 1;
            let template = state.kind.template();
            self.advance(state, &template)
        } else {
            self.render(state, step).map(Outcome::Prompt)
        }
    }

    /// Move to the next step that can be prompted, or finish the run
    fn advance(&self, state: &mut ConversationState, template: &ProgramTemplate) -> WizardResult<Outcome> {
        loop {
            let flat = template.flat_steps(state.day - 1);
            let Some(step) = flat.get(state.step).copied() else {
                match template.next_interactive_day(state.day - 1) {
                    Some(next) => {
                        state.day = next + 1;
                        state.step = 0;
                        if template.exclusion == ExclusionScope::PerDay {
                            state.used.clear();
                        }
                        info!("Moving to day {} for user {}", state.day, state.user_id);
                        continue;
                    }
                    None => return self.finish(state, template).map(Outcome::Completed),
                }
            };

            if self.catalog.exercises_for(step.group, step.subgroup).is_empty() {
                warn!(
                    "No exercises for {}/{} (day {}), skipping step {}",
                    step.group, step.subgroup, state.day, state.step
                );
                state.step += 1;
                continue;
            }

            state.current = Some(step);
            state.pending.clear();
            return self.render(state, step).map(Outcome::Prompt);
        }
    }

    fn render(&self, state: &mut ConversationState, step: FlatStep) -> WizardResult<Prompt> {
        state.generation = state.generation.wrapping_add(1);
        let prompt = render_prompt(
            self.catalog,
            PromptContext {
                step,
                excluded: &state.used,
                day: state.day,
                show_day: state.kind.template().is_multi_day(),
                picked: state.pending.len(),
                run: state.run,
                generation: state.generation,
            },
        )?;
        debug!(
            "Prompt for user {}: {}/{} day {} -> {} options",
            state.user_id,
            step.group,
            step.subgroup,
            state.day,
            prompt.options.len()
        );
        state.tokens = prompt.tokens.clone();
        Ok(prompt)
    }

    fn finish(&self, state: &mut ConversationState, template: &ProgramTemplate) -> WizardResult<SavedProgram> {
        state.current = None;
        state.pending.clear();
        state.tokens.clear();

        for (idx, plan) in template.days.iter().enumerate() {
            if let DaySource::CopyOf(src) = plan.source {
                state.picks[idx] = state.picks[src].clone();
                info!("Copied day {} to day {} for user {}", src + 1, idx + 1, state.user_id);
            }
        }

        for day in 0..template.days.len() {
            let picks = &state.picks[day];
            let expected = template.total_required_picks_for(day);
            let complete = picks.len() == expected
                && template
                    .flat_steps(day)
                    .iter()
                    .enumerate()
                    .all(|(i, s)| picks.iter().filter(|p| p.step == i).count() == s.required);
            if !complete {
                error!(
                    "Incomplete program for user {} on day {}: expected {}, got {}",
                    state.user_id,
                    day + 1,
                    expected,
                    picks.len()
                );
                return Err(WizardError::Incomplete { day: day + 1, expected, got: picks.len() });
            }
        }

        let entries = |day: usize| state.picks[day].iter().map(Pick::entry).collect::<Vec<_>>();
        let body = match template.shape {
            ResultShape::Flat => ProgramBody::Flat((0..template.days.len()).flat_map(entries).collect()),
            ResultShape::DayList => ProgramBody::DayList(
                (0..template.days.len())
                    .map(|d| DayEntry { day: d + 1, exercises: entries(d) })
                    .collect(),
            ),
            ResultShape::DayKeyed => ProgramBody::DayKeyed(
                (0..template.days.len())
                    .map(|d| (format!("day{}", d + 1), entries(d)))
                    .collect::<BTreeMap<_, _>>(),
            ),
        };

        let program = SavedProgram {
            days: template.days_per_week,
            kind: template.kind,
            label: template.label.to_string(),
            sets_reps: template.sets_reps.to_string(),
            body,
            saved_at: Utc::now(),
        };
        self.store.upsert(state.user_id, &program)?;
        self.store.flush()?;
        info!(
            "Saved {} for user {}: {} exercises",
            program.label,
            state.user_id,
            program.body.exercise_count()
        );
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const USER: i64 = 42;

    fn first_option(outcome: &Outcome) -> String {
        match outcome {
            Outcome::Prompt(p) => p.options[0].token.clone(),
            other => panic!("expected prompt, got {:?}", other),
        }
    }

    /// Pick the first offered exercise until the run ends
    fn run_to_end(wizard: &Wizard<'_>, kind: ProgramKind) -> (ConversationState, WizardResult<Outcome>) {
        let (mut state, mut outcome) = wizard.start(kind, USER).unwrap();
        loop {
            outcome = match outcome {
                Outcome::Prompt(p) => match wizard.select(&mut state, &p.options[0].token, None) {
                    Ok(next) => next,
                    Err(e) => return (state, Err(e)),
                },
                other => return (state, Ok(other)),
            };
        }
    }

    fn completed(result: WizardResult<Outcome>) -> SavedProgram {
        match result {
            Ok(Outcome::Completed(p)) => p,
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_fullbody2_flat_program() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (_, result) = run_to_end(&wizard, ProgramKind::FullBody2);
        let program = completed(result);

        let ProgramBody::Flat(entries) = &program.body else {
            panic!("expected flat body");
        };
        assert_eq!(entries.len(), 15);
        assert_eq!(entries[0], "Верх спины: Тяга штанги в наклоне");
        assert_eq!(entries[11], "Hinge: Румынская тяга");
        assert!(entries.iter().all(|e| e.contains(": ")));
        assert_eq!(program.days, 2);
        assert_eq!(program.label, "FullBody 2.0");
        assert_eq!(store.get(USER).unwrap(), Some(program));
    }

    #[test]
    fn test_upper_lower_copies_days() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (mut state, mut outcome) = wizard.start(ProgramKind::UpperLower2, USER).unwrap();
        let mut prompts = 0;
        let program = loop {
            match outcome {
                Outcome::Prompt(p) => {
                    assert!(p.day == Some(1) || p.day == Some(2));
                    prompts += 1;
                    outcome = wizard.select(&mut state, &p.options[0].token, None).unwrap();
                }
                Outcome::Completed(program) => break program,
                other => panic!("unexpected {:?}", other),
            }
        };
        assert_eq!(prompts, 16);

        let ProgramBody::DayKeyed(days) = &program.body else {
            panic!("expected day-keyed body");
        };
        assert_eq!(days["day1"].len(), 9);
        assert_eq!(days["day2"].len(), 7);
        assert_eq!(days["day3"], days["day1"]);
        assert_eq!(days["day4"], days["day2"]);
        assert_eq!(program.body.exercise_count(), 32);
    }

    #[test]
    fn test_every_variant_saves_template_total() {
        let catalog = Catalog::builtin();
        for kind in ProgramKind::all() {
            let store = MemoryStore::new();
            let wizard = Wizard::new(&catalog, &store);
            let (_, result) = run_to_end(&wizard, *kind);
            let program = completed(result);
            assert_eq!(program.body.exercise_count(), kind.template().total_required_picks());
            assert_eq!(program.days, kind.days_per_week());
        }
    }

    #[test]
    fn test_hybrid3_exclusion_resets_per_day() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let program = completed(run_to_end(&wizard, ProgramKind::Hybrid3).1);
        let ProgramBody::DayList(days) = &program.body else {
            panic!("expected day list");
        };
        assert_eq!(days.len(), 3);
        // day 2 starts over, so the same first exercise is offered again
        assert_eq!(days[0].exercises[0], days[1].exercises[0]);
    }

    #[test]
    fn test_hybrid3_v2_never_repeats_within_week() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let program = completed(run_to_end(&wizard, ProgramKind::Hybrid3V2).1);
        let ProgramBody::DayKeyed(days) = &program.body else {
            panic!("expected day-keyed body");
        };
        let all: Vec<_> = days.values().flatten().collect();
        let names: HashSet<_> = all.iter().map(|e| e.split_once(": ").unwrap().1).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_custom_cancel_then_pick() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (mut state, outcome) = wizard.start(ProgramKind::FullBody2, USER).unwrap();
        let Outcome::Prompt(prompt) = outcome else { panic!() };

        let waiting = wizard.select(&mut state, &prompt.custom_token, Some(77)).unwrap();
        assert!(matches!(waiting, Outcome::AwaitingCustom(CustomRequest { subgroup: "Верх спины", day: None })));
        assert_eq!(state.custom_prompt_message(), Some(77));

        let again = wizard.cancel_custom(&mut state).unwrap();
        assert_eq!(state.mode, Mode::ChoosingExercise);
        assert_eq!(state.step, 0);
        assert!(state.pending.is_empty());
        assert!(state.picks[0].is_empty());

        let token = first_option(&again);
        wizard.select(&mut state, &token, None).unwrap();
        assert_eq!(state.step, 1);
        assert_eq!(state.picks[0].len(), 1);
    }

    #[test]
    fn test_custom_name_bounds() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (mut state, outcome) = wizard.start(ProgramKind::FullBody2, USER).unwrap();
        let Outcome::Prompt(prompt) = outcome else { panic!() };
        wizard.select(&mut state, &prompt.custom_token, None).unwrap();

        let long = "я".repeat(101);
        for bad in ["", "   \t ", long.as_str()] {
            let err = wizard.submit_custom(&mut state, bad).unwrap_err();
            assert!(matches!(err, WizardError::InvalidCustomName));
            assert!(state.is_entering_custom());
            assert!(state.picks[0].is_empty());
        }

        let name = "я".repeat(100);
        wizard.submit_custom(&mut state, &name).unwrap();
        assert_eq!(state.picks[0][0].exercise, name);
        assert_eq!(state.mode, Mode::ChoosingExercise);
        assert_eq!(state.step, 1);
    }

    #[test]
    fn test_partial_step_rerenders_without_pick() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (mut state, _) = wizard.start(ProgramKind::FullBody2, USER).unwrap();
        let step = FlatStep { required: 2, ..state.current.unwrap() };
        state.current = Some(step);
        let prompt = wizard.render(&mut state, step).unwrap();
        let picked = prompt.options[0].label.clone();

        let next = wizard.select(&mut state, &prompt.options[0].token, None).unwrap();
        let Outcome::Prompt(next) = next else { panic!() };
        assert_eq!(next.picked, 1);
        assert!(next.options.iter().all(|o| o.label != picked));
        assert_eq!(state.step, 0);

        // same name typed in for the same step is refused and custom entry stays open
        wizard.select(&mut state, &next.custom_token, None).unwrap();
        let err = wizard.submit_custom(&mut state, &picked).unwrap_err();
        assert!(matches!(err, WizardError::DuplicatePick { .. }));
        assert!(state.is_entering_custom());
    }

    #[test]
    fn test_stale_token_does_not_resolve() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (mut state, outcome) = wizard.start(ProgramKind::FullBody2, USER).unwrap();
        let old = first_option(&outcome);
        let next = wizard.select(&mut state, &old, None).unwrap();

        // the next step happens to offer the same catalog index
        assert_ne!(first_option(&next), old);
        let err = wizard.select(&mut state, &old, None).unwrap_err();
        assert!(matches!(err, WizardError::UnknownToken(_)));
        assert_eq!(state.picks[0].len(), 1);
    }

    #[test]
    fn test_token_from_previous_run_does_not_resolve() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (_, first) = wizard.start(ProgramKind::FullBody2, USER).unwrap();
        let Outcome::Prompt(first) = first else { panic!() };
        let (mut state, second) = wizard.start(ProgramKind::UpperLower2, USER).unwrap();
        let Outcome::Prompt(second) = second else { panic!() };

        for token in first.tokens.keys() {
            assert!(!second.tokens.contains_key(token));
            let err = wizard.select(&mut state, token, None).unwrap_err();
            assert!(matches!(err, WizardError::UnknownToken(_)));
        }
        assert!(state.picks.iter().all(Vec::is_empty));
        assert!(!state.is_entering_custom());
    }

    #[test]
    fn test_token_for_another_step_is_refused() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (mut state, _) = wizard.start(ProgramKind::UpperLower2, USER).unwrap();
        state.tokens.insert(
            "ex:0:0:0".to_string(),
            Choice::Exercise { group: "Руки", subgroup: "Бицепс", exercise: "Молотки".into(), day: 1 },
        );
        state.tokens.insert("cx:0:0".to_string(), Choice::Custom { day: 2 });

        for token in ["ex:0:0:0", "cx:0:0"] {
            let err = wizard.select(&mut state, token, None).unwrap_err();
            assert!(matches!(err, WizardError::UnknownToken(_)));
        }
        assert!(state.picks[0].is_empty());
        assert!(!state.is_entering_custom());
    }

    #[test]
    fn test_pick_while_entering_custom_is_refused() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let (mut state, outcome) = wizard.start(ProgramKind::FullBody2, USER).unwrap();
        let Outcome::Prompt(prompt) = outcome else { panic!() };
        wizard.select(&mut state, &prompt.custom_token, None).unwrap();

        let err = wizard.select(&mut state, &prompt.options[0].token, None).unwrap_err();
        assert!(matches!(err, WizardError::UnknownToken(_)));
        assert!(matches!(
            wizard.submit_custom(&mut ConversationState { mode: Mode::ChoosingExercise, ..state.clone() }, "x"),
            Err(WizardError::NotEnteringCustom)
        ));
    }

    #[test]
    fn test_empty_catalog_entry_is_skipped_then_aborts() {
        let builtin = Catalog::builtin();
        let mut groups = BTreeMap::new();
        for (group, subgroup) in ProgramKind::FullBody2.template().catalog_keys() {
            if subgroup != "Икры" {
                groups
                    .entry(group.to_string())
                    .or_insert_with(BTreeMap::new)
                    .insert(subgroup.to_string(), builtin.exercises_for(group, subgroup).to_vec());
            }
        }
        let catalog = Catalog::new(groups);

        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);
        let (state, result) = run_to_end(&wizard, ProgramKind::FullBody2);

        assert!(matches!(result, Err(WizardError::Incomplete { day: 1, expected: 15, got: 14 })));
        assert!(state.picks[0].iter().all(|p| p.subgroup != "Икры"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_clear_without_program_is_noop() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);
        assert!(!wizard.clear(USER).unwrap());

        let _ = run_to_end(&wizard, ProgramKind::FullBody2);
        assert!(wizard.clear(USER).unwrap());
        assert!(store.get(USER).unwrap().is_none());
    }

    #[test]
    fn test_restart_overwrites_saved_program() {
        let catalog = Catalog::builtin();
        let store = MemoryStore::new();
        let wizard = Wizard::new(&catalog, &store);

        let _ = run_to_end(&wizard, ProgramKind::FullBody2);
        let _ = run_to_end(&wizard, ProgramKind::UpperLower2);
        let saved = store.load().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[&USER].kind, ProgramKind::UpperLower2);
    }
}
