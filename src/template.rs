//! Program templates - порядок групп мышц для каждой программы

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Sets/reps prescription for the two-day and three-day programs
pub const SETS_REPS_STANDARD: &str = "2 подхода по 4-8 повторений (Выполнять в 0-2 повторений в запасе)";

/// Sets/reps prescription for upper/lower
pub const SETS_REPS_UPPER_LOWER: &str = "1-2 подхода по 3-6 повторений (Выполнять в 0-2 повторений в запасе)";

/// How many exercises a template step asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCount {
    Picks(usize),
    /// Step fans out into sub-subgroups, each answered separately
    Split(Vec<(&'static str, usize)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateStep {
    pub group: &'static str,
    pub subgroup: &'static str,
    pub count: StepCount,
}

fn step(group: &'static str, subgroup: &'static str, picks: usize) -> TemplateStep {
    TemplateStep { group, subgroup, count: StepCount::Picks(picks) }
}

fn split(group: &'static str, subgroup: &'static str, parts: &[(&'static str, usize)]) -> TemplateStep {
    TemplateStep { group, subgroup, count: StepCount::Split(parts.to_vec()) }
}

/// One prompt after flattening: (group, subgroup, required picks)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatStep {
    pub group: &'static str,
    pub subgroup: &'static str,
    pub required: usize,
}

/// Expand split steps into one entry per sub-subgroup, keeping source order
pub fn flatten(steps: &[TemplateStep]) -> Vec<FlatStep> {
    let mut flat = Vec::with_capacity(steps.len());
    for s in steps {
        match &s.count {
            StepCount::Picks(n) => flat.push(FlatStep {
                group: s.group,
                subgroup: s.subgroup,
                required: *n,
            }),
            StepCount::Split(parts) => {
                for (sub, n) in parts {
                    flat.push(FlatStep { group: s.group, subgroup: sub, required: *n });
                }
            }
        }
    }
    flat
}

/// Sum of required picks over the flattened steps
pub fn total_required_picks(steps: &[TemplateStep]) -> usize {
    flatten(steps).iter().map(|s| s.required).sum()
}

/// Where a day's exercises come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaySource {
    Steps(Vec<TemplateStep>),
    /// Copy of an earlier day (0-based), filled in without prompting
    CopyOf(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPlan {
    pub title: &'static str,
    pub source: DaySource,
}

/// Shape of the saved program body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// One list for the whole program
    Flat,
    /// List of `{day, exercises}` entries
    DayList,
    /// Map `dayN -> exercises`
    DayKeyed,
}

/// Scope of the "already picked" exclusion set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionScope {
    PerDay,
    AcrossDays,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramKind {
    FullBody2,
    Hybrid3,
    Hybrid3V2,
    UpperLower2,
}

impl ProgramKind {
    pub fn all() -> &'static [ProgramKind] {
        &[
            ProgramKind::FullBody2,
            ProgramKind::Hybrid3,
            ProgramKind::Hybrid3V2,
            ProgramKind::UpperLower2,
        ]
    }

    pub fn callback(&self) -> &'static str {
        match self {
            ProgramKind::FullBody2 => "prog_fullbody2",
            ProgramKind::Hybrid3 => "prog_hybrid3",
            ProgramKind::Hybrid3V2 => "prog_hybrid3_v2",
            ProgramKind::UpperLower2 => "prog_upperlower2",
        }
    }

    pub fn from_callback(data: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.callback() == data)
    }

    pub fn button_label(&self) -> &'static str {
        match self {
            ProgramKind::FullBody2 => "💪 Фуллбоди x2",
            ProgramKind::Hybrid3 => "🔄 Гибрид верх-низ + фулбади",
            ProgramKind::Hybrid3V2 => "🔁 Гибрид 3.0 v2 (без повторов за неделю)",
            ProgramKind::UpperLower2 => "🔀 Верх-низ x2",
        }
    }

    pub fn days_per_week(&self) -> usize {
        match self {
            ProgramKind::FullBody2 => 2,
            ProgramKind::Hybrid3 | ProgramKind::Hybrid3V2 => 3,
            ProgramKind::UpperLower2 => 4,
        }
    }

    /// Programs offered for a given number of training days
    pub fn for_days(days: usize) -> Vec<ProgramKind> {
        Self::all().iter().copied().filter(|k| k.days_per_week() == days).collect()
    }

    pub fn template(&self) -> ProgramTemplate {
        match self {
            ProgramKind::FullBody2 => ProgramTemplate {
                kind: *self,
                label: "FullBody 2.0",
                sets_reps: SETS_REPS_STANDARD,
                days_per_week: 2,
                days: vec![DayPlan { title: "Фуллбоди", source: DaySource::Steps(full_body()) }],
                shape: ResultShape::Flat,
                exclusion: ExclusionScope::PerDay,
            },
            ProgramKind::Hybrid3 | ProgramKind::Hybrid3V2 => {
                let v2 = *self == ProgramKind::Hybrid3V2;
                ProgramTemplate {
                    kind: *self,
                    label: if v2 { "Hybrid 3.0 v2" } else { "Hybrid 3.0" },
                    sets_reps: SETS_REPS_STANDARD,
                    days_per_week: 3,
                    days: vec![
                        DayPlan { title: "Фуллбоди", source: DaySource::Steps(full_body()) },
                        DayPlan { title: "Верх", source: DaySource::Steps(upper_body()) },
                        DayPlan { title: "Низ", source: DaySource::Steps(hybrid_lower()) },
                    ],
                    shape: if v2 { ResultShape::DayKeyed } else { ResultShape::DayList },
                    exclusion: if v2 { ExclusionScope::AcrossDays } else { ExclusionScope::PerDay },
                }
            }
            ProgramKind::UpperLower2 => ProgramTemplate {
                kind: *self,
                label: "4 день верх/низ",
                sets_reps: SETS_REPS_UPPER_LOWER,
                days_per_week: 4,
                days: vec![
                    DayPlan { title: "Верх", source: DaySource::Steps(upper_body()) },
                    DayPlan { title: "Низ", source: DaySource::Steps(upper_lower_legs()) },
                    DayPlan { title: "Верх", source: DaySource::CopyOf(0) },
                    DayPlan { title: "Низ", source: DaySource::CopyOf(1) },
                ],
                shape: ResultShape::DayKeyed,
                exclusion: ExclusionScope::PerDay,
            },
        }
    }
}

/// Immutable description of one program variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramTemplate {
    pub kind: ProgramKind,
    pub label: &'static str,
    pub sets_reps: &'static str,
    pub days_per_week: usize,
    pub days: Vec<DayPlan>,
    pub shape: ResultShape,
    pub exclusion: ExclusionScope,
}

impl ProgramTemplate {
    /// Steps of a day (0-based), following copies back to their source
    pub fn steps_for(&self, day: usize) -> &[TemplateStep] {
        let mut idx = day;
        // copies only point backwards
        while let Some(plan) = self.days.get(idx) {
            match &plan.source {
                DaySource::Steps(steps) => return steps,
                DaySource::CopyOf(src) if *src < idx => idx = *src,
                DaySource::CopyOf(_) => break,
            }
        }
        &[]
    }

    pub fn flat_steps(&self, day: usize) -> Vec<FlatStep> {
        flatten(self.steps_for(day))
    }

    pub fn is_interactive(&self, day: usize) -> bool {
        matches!(self.days.get(day).map(|d| &d.source), Some(DaySource::Steps(_)))
    }

    /// First interactive day strictly after `day` (0-based)
    pub fn next_interactive_day(&self, day: usize) -> Option<usize> {
        (day + 1..self.days.len()).find(|d| self.is_interactive(*d))
    }

    pub fn first_interactive_day(&self) -> Option<usize> {
        (0..self.days.len()).find(|d| self.is_interactive(*d))
    }

    pub fn is_multi_day(&self) -> bool {
        self.days.len() > 1
    }

    pub fn total_required_picks_for(&self, day: usize) -> usize {
        total_required_picks(self.steps_for(day))
    }

    /// Picks the whole program needs, derived days included
    pub fn total_required_picks(&self) -> usize {
        (0..self.days.len()).map(|d| self.total_required_picks_for(d)).sum()
    }

    /// Subgroup -> muscle group, for grouping a saved program on display
    pub fn subgroup_groups(&self) -> HashMap<&'static str, &'static str> {
        let mut map = HashMap::new();
        for day in 0..self.days.len() {
            for s in self.flat_steps(day) {
                map.insert(s.subgroup, s.group);
            }
        }
        map
    }

    /// Every (group, subgroup) pair the template prompts for
    pub fn catalog_keys(&self) -> Vec<(&'static str, &'static str)> {
        let mut keys = Vec::new();
        for day in 0..self.days.len() {
            for s in self.flat_steps(day) {
                if !keys.contains(&(s.group, s.subgroup)) {
                    keys.push((s.group, s.subgroup));
                }
            }
        }
        keys
    }
}

fn upper_body() -> Vec<TemplateStep> {
    vec![
        step("Спина", "Верх спины", 1),
        step("Спина", "Широчайшие", 1),
        step("Дельты", "Передняя дельта", 1),
        step("Дельты", "Средняя дельта", 1),
        step("Дельты", "Задняя дельта", 1),
        step("Грудь", "Верх груди", 1),
        step("Грудь", "Низ груди", 1),
        step("Руки", "Бицепс", 1),
        step("Руки", "Трицепс", 1),
    ]
}

fn full_body() -> Vec<TemplateStep> {
    let mut steps = upper_body();
    steps.extend([
        step("Ноги", "Квадрицепсы", 1),
        split("Ноги", "Бицепс бедра", &[("Бицепс бедра", 1), ("Hinge", 1)]),
        step("Ноги", "Икры", 1),
        step("Ноги", "Приводящие", 1),
        step("Ноги", "Ягодицы", 1),
    ]);
    steps
}

fn hybrid_lower() -> Vec<TemplateStep> {
    vec![
        step("Ноги", "Квадрицепсы", 1),
        split("Ноги", "Бицепс бедра", &[("Бицепс бедра", 1), ("Hinge", 1)]),
        step("Ноги", "Приводящие", 1),
        step("Ноги", "Икры", 1),
        step("Ноги", "Ягодицы", 1),
    ]
}

fn upper_lower_legs() -> Vec<TemplateStep> {
    vec![
        step("Ноги", "Ягодицы", 1),
        split(
            "Ноги",
            "Квадрицепсы",
            &[("Квадрицепсы (приседания)", 1), ("Квадрицепсы (разгибания)", 1)],
        ),
        split("Ноги", "Бицепс бедра", &[("Бицепс бедра", 1), ("Hinge", 1)]),
        step("Ноги", "Приводящие", 1),
        step("Ноги", "Икры", 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_expands_split_in_order() {
        let flat = flatten(&full_body());
        assert_eq!(flat.len(), 15);
        assert_eq!(flat[10].subgroup, "Бицепс бедра");
        assert_eq!(flat[11].subgroup, "Hinge");
        assert_eq!(flat[11].group, "Ноги");
        assert_eq!(flat[12].subgroup, "Икры");
    }

    #[test]
    fn test_total_matches_flattened_sum() {
        for kind in ProgramKind::all() {
            let template = kind.template();
            for day in 0..template.days.len() {
                let steps = template.steps_for(day);
                let sum: usize = flatten(steps).iter().map(|s| s.required).sum();
                assert_eq!(sum, total_required_picks(steps));
            }
        }
    }

    #[test]
    fn test_split_counts_are_summed() {
        let steps = vec![split("Ноги", "Бицепс бедра", &[("Бицепс бедра", 2), ("Hinge", 1)])];
        assert_eq!(flatten(&steps).len(), 2);
        assert_eq!(total_required_picks(&steps), 3);
    }

    #[test]
    fn test_variant_totals() {
        assert_eq!(ProgramKind::FullBody2.template().total_required_picks(), 15);
        assert_eq!(ProgramKind::Hybrid3.template().total_required_picks(), 30);
        assert_eq!(ProgramKind::Hybrid3V2.template().total_required_picks(), 30);
        assert_eq!(ProgramKind::UpperLower2.template().total_required_picks(), 32);
    }

    #[test]
    fn test_upper_lower_copies_resolve_to_source() {
        let template = ProgramKind::UpperLower2.template();
        assert_eq!(template.steps_for(2), template.steps_for(0));
        assert_eq!(template.steps_for(3), template.steps_for(1));
        assert!(!template.is_interactive(2));
        assert_eq!(template.next_interactive_day(0), Some(1));
        assert_eq!(template.next_interactive_day(1), None);
    }

    #[test]
    fn test_callback_round_trip_and_menu() {
        for kind in ProgramKind::all() {
            assert_eq!(ProgramKind::from_callback(kind.callback()), Some(*kind));
        }
        assert_eq!(ProgramKind::for_days(2), vec![ProgramKind::FullBody2]);
        assert_eq!(ProgramKind::for_days(3).len(), 2);
        assert!(ProgramKind::for_days(5).is_empty());
    }

    #[test]
    fn test_subgroup_groups() {
        let map = ProgramKind::UpperLower2.template().subgroup_groups();
        assert_eq!(map.get("Hinge"), Some(&"Ноги"));
        assert_eq!(map.get("Квадрицепсы (разгибания)"), Some(&"Ноги"));
        assert_eq!(map.get("Широчайшие"), Some(&"Спина"));
    }
}
