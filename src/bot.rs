use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ReplyParameters};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::gemini::{GeminiClient, ReplyProvider};
use crate::store::MessageStore;

/// Sending this exact phrase (compared case-insensitively) asks the user for
/// their question instead of forwarding the text to Gemini.
const ASK_TRIGGER: &str = "задать вопрос";
const ASK_PROMPT: &str = "Please ask your question.";

/// Greeting fallback when the transport carries no display name.
const FALLBACK_NAME: &str = "friend";

const HELP_TEXT: &str = "I answer your questions with Gemini.\n\n\
    Available commands:\n\
    /start - Start the conversation\n\
    /help - Show this message\n";

/// Apology sent when the reply itself could not be delivered.
const SEND_FAILED_TEXT: &str = "Sorry, something went wrong while handling your message.";

/// Shared application state
pub struct AppState {
    store: MessageStore,
    gemini: GeminiClient,
    config: Config,
}

impl AppState {
    pub fn new(config: Config, store: MessageStore) -> Result<Self> {
        let gemini = GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )?;
        Ok(Self {
            store,
            gemini,
            config,
        })
    }
}

/// Commands the bot understands.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Start,
    Help,
}

/// Case-insensitive match on the first whitespace-delimited token.
fn parse_command(text: &str) -> Option<Command> {
    let token = text.split_whitespace().next()?;
    match token.to_lowercase().as_str() {
        "/start" => Some(Command::Start),
        "/help" => Some(Command::Help),
        _ => None,
    }
}

fn greeting(first_name: &str) -> String {
    let name = first_name.trim();
    let name = if name.is_empty() { FALLBACK_NAME } else { name };
    format!("Welcome, {name}! How can I help you?")
}

/// Start the Telegram bot and poll until shutdown. The bot's transport
/// session is dropped exactly once when dispatch returns, on every exit path.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = Bot::new(&state.config.bot_token);

    info!("Starting Telegram bot...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Ignoring non-message update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped.");
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let user = match msg.from.as_ref() {
        Some(user) => user,
        None => return Ok(()),
    };

    // Stickers, photos and the like fall through without a reply.
    let text = match msg.text() {
        Some(t) => t.to_string(),
        None => return Ok(()),
    };

    let user_id = user.id.0 as i64;
    info!("Message from user {}: {}", user_id, text);

    match parse_command(&text) {
        Some(Command::Start) => {
            bot.send_message(msg.chat.id, greeting(&user.first_name))
                .await?;
            return Ok(());
        }
        Some(Command::Help) => {
            bot.send_message(msg.chat.id, HELP_TEXT).await?;
            return Ok(());
        }
        None => {}
    }

    // Best-effort "typing..." indicator; a failure here must not stop the reply.
    bot.send_chat_action(msg.chat.id, ChatAction::Typing)
        .await
        .ok();

    let reply = process_text(&state.store, &state.gemini, user_id, &text).await;

    let sent = bot
        .send_message(msg.chat.id, reply)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await;

    if let Err(e) = sent {
        error!("Failed to deliver reply to chat {}: {:?}", msg.chat.id, e);
        // Last resort; if even this fails the transport is gone.
        bot.send_message(msg.chat.id, SEND_FAILED_TEXT).await.ok();
    }

    Ok(())
}

/// Per-message pipeline: trigger check, persist, generate. Always yields
/// reply text; a storage failure is logged and swallowed so the user still
/// gets an answer attempt.
async fn process_text<P: ReplyProvider>(
    store: &MessageStore,
    provider: &P,
    user_id: i64,
    text: &str,
) -> String {
    if text.trim().to_lowercase() == ASK_TRIGGER {
        return ASK_PROMPT.to_string();
    }

    if let Err(e) = store.record_message(user_id, text).await {
        error!("Failed to record message from user {}: {:#}", user_id, e);
    }

    provider.reply(text).await
}
