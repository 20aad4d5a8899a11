//! Exercise catalog - база упражнений по группам мышц

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::template::ProgramKind;

/// Group -> subgroup -> exercises, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    groups: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// A (group, subgroup) pair some template asks for but the catalog has no exercises for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingEntry {
    pub program: ProgramKind,
    pub group: &'static str,
    pub subgroup: &'static str,
}

impl Catalog {
    pub fn new(groups: BTreeMap<String, BTreeMap<String, Vec<String>>>) -> Self {
        Self { groups }
    }

    /// Catalog compiled into the binary
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for (group, subgroups) in BUILTIN {
            for (subgroup, exercises) in *subgroups {
                catalog.insert(group, subgroup, exercises.iter().copied());
            }
        }
        catalog
    }

    /// Load a catalog from a JSON file of the same nested shape
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog = serde_json::from_str(&content)
            .with_context(|| format!("parsing catalog {}", path.display()))?;
        Ok(catalog)
    }

    pub fn insert<'a>(
        &mut self,
        group: &str,
        subgroup: &str,
        exercises: impl IntoIterator<Item = &'a str>,
    ) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .entry(subgroup.to_string())
            .or_default()
            .extend(exercises.into_iter().map(str::to_string));
    }

    /// Exercises for a subgroup (empty if absent)
    pub fn exercises_for(&self, group: &str, subgroup: &str) -> &[String] {
        self.groups
            .get(group)
            .and_then(|g| g.get(subgroup))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every prompt of every program that would come up empty
    pub fn missing_for(&self, programs: &[ProgramKind]) -> Vec<MissingEntry> {
        let mut missing = Vec::new();
        for program in programs {
            for (group, subgroup) in program.template().catalog_keys() {
                if self.exercises_for(group, subgroup).is_empty() {
                    missing.push(MissingEntry { program: *program, group, subgroup });
                }
            }
        }
        missing
    }
}

type Subgroups = &'static [(&'static str, &'static [&'static str])];

const BUILTIN: &[(&str, Subgroups)] = &[
    ("Спина", &[
        ("Верх спины", &[
            "Тяга штанги в наклоне",
            "Тяга гантели к поясу",
            "Тяга в тренажере с упором в грудь",
            "Горизонтальная тяга блока",
        ]),
        ("Широчайшие", &[
            "Подтягивания",
            "Тяга верхнего блока",
            "Пуловер на блоке",
            "Тяга одной рукой в тренажере",
        ]),
    ]),
    ("Дельты", &[
        ("Передняя дельта", &[
            "Жим штанги стоя",
            "Жим гантелей сидя",
            "Жим в тренажере на плечи",
        ]),
        ("Средняя дельта", &[
            "Махи гантелями в стороны",
            "Махи в кроссовере",
            "Тяга штанги к подбородку",
        ]),
        ("Задняя дельта", &[
            "Обратные разведения в тренажере",
            "Разведения в наклоне",
            "Тяга каната к лицу",
        ]),
    ]),
    ("Грудь", &[
        ("Верх груди", &[
            "Жим штанги на наклонной скамье",
            "Жим гантелей на наклонной скамье",
            "Сведения в кроссовере снизу вверх",
        ]),
        ("Низ груди", &[
            "Жим штанги лежа",
            "Отжимания на брусьях",
            "Жим в тренажере сидя",
            "Сведения в тренажере",
        ]),
    ]),
    ("Руки", &[
        ("Бицепс", &[
            "Подъем штанги на бицепс",
            "Молотки",
            "Сгибания на скамье Скотта",
            "Сгибания на блоке",
        ]),
        ("Трицепс", &[
            "Французский жим",
            "Разгибания на блоке",
            "Жим узким хватом",
            "Разгибания из-за головы",
        ]),
    ]),
    ("Ноги", &[
        ("Квадрицепсы", &[
            "Приседания со штангой",
            "Жим ногами",
            "Гакк-приседания",
            "Разгибания ног",
        ]),
        ("Квадрицепсы (приседания)", &[
            "Приседания со штангой",
            "Гакк-приседания",
            "Болгарские выпады",
        ]),
        ("Квадрицепсы (разгибания)", &[
            "Разгибания ног",
            "Сисси-приседания",
        ]),
        ("Бицепс бедра", &[
            "Сгибания ног лежа",
            "Сгибания ног сидя",
        ]),
        ("Hinge", &[
            "Румынская тяга",
            "Становая тяга",
            "Гиперэкстензия",
        ]),
        ("Икры", &[
            "Подъемы на носки стоя",
            "Подъемы на носки сидя",
        ]),
        ("Приводящие", &[
            "Сведения ног в тренажере",
            "Выпады в сторону",
        ]),
        ("Ягодицы", &[
            "Ягодичный мост",
            "Отведения ноги в кроссовере",
            "Разведения ног в тренажере",
        ]),
    ]),
];
