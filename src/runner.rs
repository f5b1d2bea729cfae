use crate::bot::handlers::{self, CallbackOrigin, Command};
use crate::bot::transport::TelegramTransport;
use crate::bot::{inline, BotContext};
use crate::config::{Settings, INLINE_CACHE_TIME_SECS};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineQuery};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Run the bot until Ctrl-C, then flush the in-memory caches.
///
/// # Errors
///
/// Returns an error if the lyrics API URL is invalid or the API is not
/// healthy at startup.
pub async fn run_bot(settings: Arc<Settings>) -> Result<()> {
    let ctx = Arc::new(BotContext::from_settings(&settings)?);
    info!("Lyrics API client initialized ({}).", settings.api_base_url);
    check_api_health(&ctx).await?;

    let bot = Bot::new(settings.telegram_bot_token.clone());
    register_commands(&bot).await;

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx.clone(), transport])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped, shutting down.");
    ctx.shutdown();
    Ok(())
}

async fn check_api_health(ctx: &BotContext) -> Result<()> {
    match ctx.api.health().await {
        Ok(health) => {
            info!("Lyrics API health check: {health}");
            Ok(())
        }
        Err(e) => {
            error!("Lyrics API health check failed: {e}");
            Err(anyhow!("lyrics API is not healthy: {e}"))
        }
    }
}

async fn register_commands(bot: &Bot) {
    match bot.set_my_commands(Command::bot_commands()).await {
        Ok(_) => info!("Bot commands menu set successfully"),
        Err(e) => error!("Failed to set bot commands: {}", e),
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_inline_query().endpoint(handle_inline_query))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| {
                        msg.text().is_some_and(|text| !text.starts_with('/'))
                    })
                    .endpoint(handle_text),
                ),
        )
}

async fn handle_command(
    msg: Message,
    cmd: Command,
    ctx: Arc<BotContext>,
    transport: Arc<TelegramTransport>,
) -> Result<(), teloxide::RequestError> {
    let user_id = get_user_id_safe(&msg);
    if let Err(e) =
        handlers::handle_command(&ctx, transport.as_ref(), msg.chat.id, user_id, cmd).await
    {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    msg: Message,
    ctx: Arc<BotContext>,
    transport: Arc<TelegramTransport>,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return respond(());
    };
    let user_id = get_user_id_safe(&msg);
    if let Err(e) =
        handlers::handle_text(&ctx, transport.as_ref(), msg.chat.id, user_id, text).await
    {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_callback_query(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<BotContext>,
    transport: Arc<TelegramTransport>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!("Failed to answer callback query: {}", e);
    }

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        return respond(());
    };
    let origin = CallbackOrigin {
        user_id: q.from.id.0.cast_signed(),
        chat_id: message.chat().id,
        message_id: message.id(),
    };

    if let Err(e) = handlers::handle_callback(&ctx, transport.as_ref(), origin, data).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}

async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    ctx: Arc<BotContext>,
) -> Result<(), teloxide::RequestError> {
    let Some(answer) = inline::answer_query(&ctx, &q.query, &q.offset).await else {
        return respond(());
    };

    let count = answer.results.len();
    let mut request = bot
        .answer_inline_query(q.id.clone(), answer.results)
        .cache_time(INLINE_CACHE_TIME_SECS);
    if let Some(next_offset) = answer.next_offset.clone() {
        request = request.next_offset(next_offset);
    }

    match request.await {
        Ok(_) => info!(
            count,
            next_offset = ?answer.next_offset,
            "Inline query answered"
        ),
        Err(e) => error!("Inline query answer error: {}", e),
    }
    respond(())
}
