//! Prompt rendering and inline keyboards

use std::collections::{HashMap, HashSet};

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{error, warn};
use url::Url;

use crate::catalog::Catalog;
use crate::error::{CALLBACK_DATA_LIMIT, WizardError, WizardResult};
use crate::template::{FlatStep, ProgramKind};

pub const EXERCISE_PREFIX: &str = "ex:";
pub const CUSTOM_PREFIX: &str = "cx:";
pub const CANCEL_CUSTOM: &str = "cancel_custom_exercise";
pub const CLEAR_PROGRAM: &str = "clear_program";
pub const START_PROGRAMMA: &str = "start_programma";
pub const BACK_TO_DAYS: &str = "back_to_days";
pub const DAYS_PREFIX: &str = "days_";

pub const TUTORIALS_URL: &str = "https://t.me/+IkIXHNQL3vgyYzQ8";

const CUSTOM_LABEL: &str = "✍️ Вписать свое упражнение";
const TUTORIALS_LABEL: &str = "🎥 Туторы и замены";

/// What a token stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Exercise {
        group: &'static str,
        subgroup: &'static str,
        exercise: String,
        day: usize,
    },
    Custom {
        day: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOption {
    pub label: String,
    pub token: String,
}

/// Everything needed to render one step
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub step: FlatStep,
    pub excluded: &'a HashSet<String>,
    /// 1-based
    pub day: usize,
    pub show_day: bool,
    pub picked: usize,
    /// Wizard run id; tokens of other runs never match
    pub run: u32,
    pub generation: u32,
}

/// A rendered step: options offered plus the table resolving their tokens
#[derive(Debug, Clone)]
pub struct Prompt {
    pub step: FlatStep,
    pub day: Option<usize>,
    pub picked: usize,
    pub options: Vec<PromptOption>,
    pub custom_token: String,
    pub tokens: HashMap<String, Choice>,
}

impl Prompt {
    pub fn text(&self) -> String {
        let day = day_suffix(self.day);
        if self.picked == 0 {
            format!(
                "💪 <b>Выберите {} упражнение для {}{}</b>\n📋 Доступные варианты:",
                self.step.required, self.step.subgroup, day
            )
        } else {
            format!(
                "✅ <b>Выбрано {}/{} для {}{}</b>",
                self.picked, self.step.required, self.step.subgroup, day
            )
        }
    }
}

pub fn day_suffix(day: Option<usize>) -> String {
    day.map(|d| format!(" (День {})", d)).unwrap_or_default()
}

/// Reject payloads Telegram would refuse instead of truncating them
pub fn check_token(token: &str) -> WizardResult<()> {
    if token.len() > CALLBACK_DATA_LIMIT {
        error!("Callback data too long: {}", token);
        return Err(WizardError::TokenTooLong {
            token: token.to_string(),
            len: token.len(),
        });
    }
    Ok(())
}

pub fn is_wizard_token(data: &str) -> bool {
    data.starts_with(EXERCISE_PREFIX) || data.starts_with(CUSTOM_PREFIX)
}

/// List catalog exercises for the step minus excluded ones, then the custom option
pub fn render_prompt(catalog: &Catalog, ctx: PromptContext<'_>) -> WizardResult<Prompt> {
    render_tagged(catalog, ctx, &format!("{}:{}", ctx.run, ctx.generation))
}

fn render_tagged(catalog: &Catalog, ctx: PromptContext<'_>, tag: &str) -> WizardResult<Prompt> {
    let mut options = Vec::new();
    let mut tokens = HashMap::new();

    for (idx, exercise) in catalog.exercises_for(ctx.step.group, ctx.step.subgroup).iter().enumerate() {
        if ctx.excluded.contains(exercise) {
            continue;
        }
        let token = format!("{}{}:{}", EXERCISE_PREFIX, tag, idx);
        check_token(&token)?;
        tokens.insert(
            token.clone(),
            Choice::Exercise {
                group: ctx.step.group,
                subgroup: ctx.step.subgroup,
                exercise: exercise.clone(),
                day: ctx.day,
            },
        );
        options.push(PromptOption { label: exercise.clone(), token });
    }

    let custom_token = format!("{}{}", CUSTOM_PREFIX, tag);
    check_token(&custom_token)?;
    tokens.insert(custom_token.clone(), Choice::Custom { day: ctx.day });

    Ok(Prompt {
        step: ctx.step,
        day: ctx.show_day.then_some(ctx.day),
        picked: ctx.picked,
        options,
        custom_token,
        tokens,
    })
}

pub fn prompt_markup(prompt: &Prompt) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = prompt
        .options
        .iter()
        .map(|o| vec![InlineKeyboardButton::callback(o.label.clone(), o.token.clone())])
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(CUSTOM_LABEL, prompt.custom_token.clone())]);
    InlineKeyboardMarkup::new(rows)
}

pub fn cancel_custom_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback("❌ Отмена", CANCEL_CUSTOM)]])
}

pub fn days_markup() -> InlineKeyboardMarkup {
    let rows = [2, 3, 4].into_iter().map(|d| {
        vec![InlineKeyboardButton::callback(
            format!("📅 {} дня", d),
            format!("{}{}", DAYS_PREFIX, d),
        )]
    });
    InlineKeyboardMarkup::new(rows)
}

pub fn programs_markup(days: usize) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = ProgramKind::for_days(days)
        .into_iter()
        .map(|k| vec![InlineKeyboardButton::callback(k.button_label(), k.callback())])
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Назад", BACK_TO_DAYS)]);
    InlineKeyboardMarkup::new(rows)
}

fn tutorials_button() -> Option<InlineKeyboardButton> {
    match Url::parse(TUTORIALS_URL) {
        Ok(url) => Some(InlineKeyboardButton::url(TUTORIALS_LABEL, url)),
        Err(e) => {
            warn!("Bad tutorials link {}: {}", TUTORIALS_URL, e);
            None
        }
    }
}

/// Link to technique videos and exercise swaps
pub fn tutorials_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(tutorials_button().map(|b| vec![b]))
}

pub fn saved_program_markup() -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![InlineKeyboardButton::callback("🗑 Удалить программу", CLEAR_PROGRAM)],
        vec![InlineKeyboardButton::callback("🏋️ Новая программа", START_PROGRAMMA)],
    ];
    rows.extend(tutorials_button().map(|b| vec![b]));
    InlineKeyboardMarkup::new(rows)
}

pub fn new_program_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🏋️ Новая программа",
        START_PROGRAMMA,
    )]])
}
