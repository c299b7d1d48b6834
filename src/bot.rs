//! Discord side of the bot: framework setup, commands and the ready hook.

use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::codegen::{self, DISCORD_MESSAGE_LIMIT};
use crate::config::{Config, COMMAND_PREFIX, DISCORD_TOKEN_ENV, PRESENCE};
use crate::integrations::GeminiClient;
use crate::prompts::{API_ERROR_NOTICE, HELP_FOOTER};
use crate::{Error, Result};

/// State shared by every command invocation.
pub struct Data {
    gemini: GeminiClient,
}

impl Data {
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }
}

pub type Context<'a> = poise::Context<'a, Data, Error>;

/// How [`launch`] ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// No Discord token; nothing was connected.
    MissingToken,
    /// The gateway loop returned.
    Stopped,
}

/// Generates ONLY Lua code. Usage: !code <prompt>
#[poise::command(prefix_command, category = "Lua")]
pub async fn code(
    ctx: Context<'_>,
    #[description = "What the Lua code should do"]
    #[rest]
    prompt: String,
) -> Result<()> {
    // Typing indicator while Gemini works.
    ctx.defer().await?;

    let reply = codegen::respond(&ctx.data().gemini, &prompt).await;
    send_reply(ctx, &reply.message()).await
}

/// Shows this menu
#[poise::command(prefix_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help about"]
    #[rest]
    command: Option<String>,
) -> Result<()> {
    let config = poise::builtins::HelpConfiguration {
        extra_text_at_bottom: HELP_FOOTER,
        ..Default::default()
    };
    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}

/// Post `text`, split into as many messages as Discord needs.
async fn send_reply(ctx: Context<'_>, text: &str) -> Result<()> {
    for chunk in codegen::split_message(text, DISCORD_MESSAGE_LIMIT) {
        if let Err(err) = ctx.say(chunk).await {
            error!("Failed to send reply: {}", err);
            ctx.say(API_ERROR_NOTICE).await?;
            break;
        }
    }
    Ok(())
}

/// Operator console line printed once the session is up.
pub fn ready_banner(user: &str) -> String {
    format!("🤖 Lua Code Bot is ready and logged in as {}", user)
}

fn on_ready(ctx: &serenity::Context, ready: &serenity::Ready) {
    info!("{}", ready_banner(&ready.user.tag()));
    ctx.set_activity(Some(serenity::ActivityData::playing(PRESENCE)));
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(command = %ctx.command().qualified_name, "Command failed: {}", error);
        }
        other => {
            if let Err(err) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", err);
            }
        }
    }
}

/// Gateway intents: the defaults plus message content, which prefix commands
/// need to read their arguments.
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT
}

pub fn framework_options() -> poise::FrameworkOptions<Data, Error> {
    poise::FrameworkOptions {
        commands: vec![code(), help()],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(COMMAND_PREFIX.to_string()),
            ..Default::default()
        },
        on_error: |error| Box::pin(on_error(error)),
        ..Default::default()
    }
}

fn build_framework(data: Data) -> poise::Framework<Data, Error> {
    poise::Framework::builder()
        .options(framework_options())
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                on_ready(ctx, ready);
                Ok(data)
            })
        })
        .build()
}

/// Connect to Discord and run until the gateway loop exits.
///
/// A missing token is logged and reported as [`Launch::MissingToken`]
/// before any client is built. Login and connection failures are returned.
pub async fn launch(config: &Config, gemini: GeminiClient) -> Result<Launch> {
    let Some(token) = config.discord_token() else {
        error!("ERROR: {} not found. Bot cannot connect.", DISCORD_TOKEN_ENV);
        return Ok(Launch::MissingToken);
    };

    let framework = build_framework(Data::new(gemini));
    let mut client = serenity::ClientBuilder::new(token, intents())
        .framework(framework)
        .await?;

    info!("Connecting to Discord...");
    client.start().await?;

    Ok(Launch::Stopped)
}
