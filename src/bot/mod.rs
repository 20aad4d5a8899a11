//! Telegram bot module - program builder dialogs

use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage},
    prelude::*,
    types::{BotCommand, InlineKeyboardMarkup, MessageId, ParseMode},
    utils::command::BotCommands,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::db::{Database, ProgramStore, SavedProgram};
use crate::error::{WizardError, WizardResult};
use crate::format::{MESSAGE_LIMIT, format_program, split_message};
use crate::keyboard::{
    BACK_TO_DAYS, CANCEL_CUSTOM, CLEAR_PROGRAM, DAYS_PREFIX, START_PROGRAMMA, cancel_custom_markup,
    days_markup, is_wizard_token, new_program_markup, programs_markup, prompt_markup,
    saved_program_markup, tutorials_markup,
};
use crate::template::ProgramKind;
use crate::wizard::{ConversationState, Outcome, Wizard};

type MyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type SharedDb = Arc<Mutex<Database>>;

const DAYS_QUESTION: &str = "📅 <b>Сколько дней в неделю будете тренироваться?</b>";
const PROGRAM_CLEARED: &str =
    "🗑 <b>Программа удалена!</b>\nСоздайте новую с помощью /programma или /start";
const RESTART_HINT: &str = "❗ Ошибка: не все упражнения выбраны. Начните заново с /programma";

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    /// Wizard run in progress
    Building(ConversationState),
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Команды бота:")]
pub enum Command {
    #[command(description = "Начать работу")]
    Start,
    #[command(description = "Показать помощь")]
    Help,
    #[command(description = "Составить или посмотреть программу")]
    Programma,
    #[command(description = "Удалить программу")]
    Clear,
}

/// Where a reply goes: edit the message with the keyboard, or send a new one
#[derive(Clone, Copy)]
enum Target {
    Edit(ChatId, MessageId),
    Send(ChatId),
}

impl Target {
    fn chat_id(&self) -> ChatId {
        match self {
            Target::Edit(chat_id, _) | Target::Send(chat_id) => *chat_id,
        }
    }
}

async fn show(
    bot: &Bot,
    target: Target,
    text: String,
    markup: Option<InlineKeyboardMarkup>,
) -> HandlerResult {
    match target {
        Target::Edit(chat_id, message_id) => {
            let mut req = bot
                .edit_message_text(chat_id, message_id, text)
                .parse_mode(ParseMode::Html);
            if let Some(markup) = markup {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Target::Send(chat_id) => {
            let mut req = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
            if let Some(markup) = markup {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
    }
    Ok(())
}

/// Send a program summary, split into several messages if needed
async fn send_program(bot: &Bot, chat_id: ChatId, program: &SavedProgram) -> HandlerResult {
    let chunks = split_message(&format_program(program), MESSAGE_LIMIT);
    let last = chunks.len().saturating_sub(1);
    for (i, chunk) in chunks.into_iter().enumerate() {
        let req = bot.send_message(chat_id, chunk).parse_mode(ParseMode::Html);
        if i == last {
            req.reply_markup(saved_program_markup()).await?;
        } else {
            req.await?;
        }
    }
    Ok(())
}

/// Best-effort cleanup; a message that is already gone is not an error
async fn delete_quietly(bot: &Bot, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = bot.delete_message(chat_id, message_id).await {
        warn!("Failed to delete message {} in {}: {}", message_id.0, chat_id, e);
    }
}

/// Text shown for errors the user can fix by trying again
fn describe(e: &WizardError) -> &'static str {
    match e {
        WizardError::InvalidCustomName => {
            "❗ Название упражнения не может быть пустым или длиннее 100 символов!\nПопробуйте снова:"
        }
        WizardError::StepSaturated { .. } => "❗ Вы уже выбрали максимум упражнений для этой группы!",
        WizardError::DuplicatePick { .. } => "❗ Это упражнение уже выбрано для этой группы",
        _ => "❌ Упражнение не найдено! Обновите список или начните заново с /programma",
    }
}

/// Store the new state and render what the wizard asked for.
/// Returns text for user errors so the caller can answer in its own way.
async fn apply(
    bot: &Bot,
    dialogue: &MyDialogue,
    target: Target,
    conv: ConversationState,
    result: WizardResult<Outcome>,
) -> Result<Option<&'static str>, Box<dyn std::error::Error + Send + Sync>> {
    let user_id = conv.user_id;
    match result {
        Ok(Outcome::Prompt(prompt)) => {
            dialogue.update(State::Building(conv)).await?;
            show(bot, target, prompt.text(), Some(prompt_markup(&prompt))).await?;
        }
        Ok(Outcome::AwaitingCustom(request)) => {
            dialogue.update(State::Building(conv)).await?;
            show(bot, target, request.text(), Some(cancel_custom_markup())).await?;
        }
        Ok(Outcome::Completed(program)) => {
            dialogue.reset().await?;
            let text = format!(
                "✅ <b>Программа «{}» сохранена!</b>\n/programma - просмотреть программу",
                program.label
            );
            show(bot, target, text, None).await?;
            info!("Program completed for user {}", user_id);
        }
        Err(e) if e.is_user_error() => {
            dialogue.update(State::Building(conv)).await?;
            return Ok(Some(describe(&e)));
        }
        Err(e @ WizardError::Incomplete { .. }) => {
            warn!("Aborting wizard for user {}: {}", user_id, e);
            dialogue.reset().await?;
            bot.send_message(target.chat_id(), RESTART_HINT).await?;
        }
        Err(e) => {
            error!("Wizard failed for user {}: {}", user_id, e);
            dialogue.reset().await?;
            bot.send_message(
                target.chat_id(),
                "⚠️ Не удалось составить программу. Попробуйте позже: /programma",
            )
            .await?;
        }
    }
    Ok(None)
}

async fn clear_program(
    bot: &Bot,
    dialogue: &MyDialogue,
    target: Target,
    user_id: i64,
    db: &SharedDb,
    catalog: &Catalog,
) -> HandlerResult {
    let removed = {
        let db = db.lock().await;
        Wizard::new(catalog, &*db).clear(user_id)?
    };
    if !removed {
        info!("User {} cleared a program that did not exist", user_id);
    }
    dialogue.reset().await?;
    show(bot, target, PROGRAM_CLEARED.to_string(), Some(new_program_markup())).await
}

/// Start the Telegram bot
pub async fn run_bot(token: String, db_path: &str, catalog: Catalog) -> anyhow::Result<()> {
    let missing = catalog.missing_for(ProgramKind::all());
    if !missing.is_empty() {
        for m in &missing {
            error!("No exercises for {}/{} ({:?})", m.group, m.subgroup, m.program);
        }
        anyhow::bail!("catalog has {} empty entries, see check-catalog", missing.len());
    }

    let db = Database::open(db_path)?;
    info!("Loaded {} saved programs from {}", db.load()?.len(), db_path);
    let db: SharedDb = Arc::new(Mutex::new(db));
    let catalog = Arc::new(catalog);

    let bot = Bot::new(token);
    let commands: Vec<BotCommand> = Command::bot_commands();
    match bot.set_my_commands(commands).await {
        Ok(_) => info!("Bot commands updated"),
        Err(e) => error!("Failed to set bot commands: {}", e),
    }

    let handler = dptree::entry()
        .enter_dialogue::<Update, InMemStorage<State>, State>()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            Update::filter_message()
                .endpoint(handle_message),
        )
        .branch(
            Update::filter_callback_query()
                .endpoint(handle_callback),
        );

    info!("Bot is running");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<State>::new(), db, catalog])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn message_user_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .map(|u| u.id.0 as i64)
        .unwrap_or(msg.chat.id.0)
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: MyDialogue,
    db: SharedDb,
    catalog: Arc<Catalog>,
) -> HandlerResult {
    let user_id = message_user_id(&msg);

    match cmd {
        Command::Start => {
            dialogue.reset().await?;
            let text = format!(
                "🏋️ <b>Конструктор программы тренировок</b>\n\n\
                Выберите количество тренировочных дней, затем упражнения \
                для каждой группы мышц.\n\n{}",
                DAYS_QUESTION
            );
            show(&bot, Target::Send(msg.chat.id), text, Some(days_markup())).await?;
            info!("User {} started the bot", user_id);
        }

        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .reply_markup(tutorials_markup())
                .await?;
        }

        Command::Programma => {
            let saved = db.lock().await.get(user_id)?;
            match saved {
                Some(program) => send_program(&bot, msg.chat.id, &program).await?,
                None => {
                    dialogue.reset().await?;
                    show(&bot, Target::Send(msg.chat.id), DAYS_QUESTION.to_string(), Some(days_markup()))
                        .await?;
                }
            }
        }

        Command::Clear => {
            clear_program(&bot, &dialogue, Target::Send(msg.chat.id), user_id, &db, &catalog).await?;
        }
    }

    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dialogue: MyDialogue,
    db: SharedDb,
    catalog: Arc<Catalog>,
) -> HandlerResult {
    let state = dialogue.get().await?.unwrap_or_default();

    match state {
        State::Building(mut conv) if conv.is_entering_custom() => {
            let Some(text) = msg.text() else {
                bot.send_message(msg.chat.id, "Напишите название упражнения текстом")
                    .await?;
                return Ok(());
            };

            let prompt_message = conv.custom_prompt_message();
            let result = {
                let db = db.lock().await;
                Wizard::new(&catalog, &*db).submit_custom(&mut conv, text)
            };

            let accepted = !matches!(&result, Err(e) if e.is_user_error());
            if accepted {
                if let Some(id) = prompt_message {
                    delete_quietly(&bot, msg.chat.id, MessageId(id)).await;
                }
                delete_quietly(&bot, msg.chat.id, msg.id).await;
            }

            if let Some(reply) = apply(&bot, &dialogue, Target::Send(msg.chat.id), conv, result).await? {
                bot.send_message(msg.chat.id, reply).await?;
            }
        }

        State::Building(_) => {
            bot.send_message(
                msg.chat.id,
                "Выберите упражнение кнопкой выше или начните заново с /programma",
            )
            .await?;
        }

        State::Start => {
            bot.send_message(msg.chat.id, "Жми /programma чтобы составить программу")
                .await?;
        }
    }

    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: MyDialogue,
    db: SharedDb,
    catalog: Arc<Catalog>,
) -> HandlerResult {
    let alert = match &q.data {
        Some(data) => route_callback(&bot, &q, data, &dialogue, &db, &catalog).await?,
        None => None,
    };

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(text) = alert {
        answer = answer.text(text).show_alert(true);
    }
    answer.await?;
    Ok(())
}

async fn route_callback(
    bot: &Bot,
    q: &CallbackQuery,
    data: &str,
    dialogue: &MyDialogue,
    db: &SharedDb,
    catalog: &Catalog,
) -> Result<Option<&'static str>, Box<dyn std::error::Error + Send + Sync>> {
    let user_id = q.from.id.0 as i64;
    let message_id = q.message.as_ref().map(|m| m.id());
    let target = match &q.message {
        Some(m) => Target::Edit(m.chat().id, m.id()),
        None => Target::Send(ChatId(user_id)),
    };

    if data == START_PROGRAMMA || data == BACK_TO_DAYS {
        show(bot, target, DAYS_QUESTION.to_string(), Some(days_markup())).await?;
        return Ok(None);
    }

    if data == CLEAR_PROGRAM {
        clear_program(bot, dialogue, target, user_id, db, catalog).await?;
        return Ok(None);
    }

    if let Some(days) = data.strip_prefix(DAYS_PREFIX) {
        let Ok(days) = days.parse::<usize>() else {
            return Ok(None);
        };
        let text = format!("💪 <b>Программы на {} дня в неделю:</b>", days);
        show(bot, target, text, Some(programs_markup(days))).await?;
        return Ok(None);
    }

    if let Some(kind) = ProgramKind::from_callback(data) {
        let started = {
            let db = db.lock().await;
            Wizard::new(catalog, &*db).start(kind, user_id)
        };
        return match started {
            Ok((conv, outcome)) => apply(bot, dialogue, target, conv, Ok(outcome)).await,
            Err(e) => {
                error!("Failed to start {:?} for user {}: {}", kind, user_id, e);
                dialogue.reset().await?;
                bot.send_message(target.chat_id(), "⚠️ Не удалось начать программу").await?;
                Ok(None)
            }
        };
    }

    let state = dialogue.get().await?.unwrap_or_default();
    let State::Building(mut conv) = state else {
        return Ok(Some("❗ Нет активного выбора. Начните с /programma"));
    };

    if data == CANCEL_CUSTOM {
        let result = {
            let db = db.lock().await;
            Wizard::new(catalog, &*db).cancel_custom(&mut conv)
        };
        return apply(bot, dialogue, target, conv, result).await;
    }

    if is_wizard_token(data) {
        let result = {
            let db = db.lock().await;
            Wizard::new(catalog, &*db).select(&mut conv, data, message_id.map(|id| id.0))
        };
        return apply(bot, dialogue, target, conv, result).await;
    }

    warn!("Unhandled callback data from user {}: {}", user_id, data);
    Ok(None)
}
