use ::serenity::all::ClientBuilder;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use tracing::info;

pub mod commands;
pub mod config;
pub mod events;
pub mod library;
pub mod player;

use commands::{
    playback::{pause::*, play::*, stop::*},
    tracks::{delete::*, list::*, rename::*, upload::*},
};
use config::Config;
use library::TrackLibrary;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared state available to every command invocation.
pub struct Data {
    pub config: Config,
    pub library: TrackLibrary,
}

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration::default(),
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

/// Command check: the caller holds the configured role, or is a guild
/// administrator. With no role configured, administrators only.
async fn authorized(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };

    let member = guild_id.member(ctx, ctx.author().id).await?;

    if let Some(role_id) = ctx.data().config.role {
        if member.roles.contains(&role_id) {
            return Ok(true);
        }
    }

    for role in &member.roles {
        if role
            .to_role_cached(ctx)
            .is_some_and(|r| r.has_permission(serenity::Permissions::ADMINISTRATOR))
        {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Load config and library, register commands in the configured guild,
/// and run the gateway client until it exits.
pub async fn run() -> Result<(), Error> {
    let config = Config::load_or_init()?;
    let token = config.discord_token()?;
    let guild_id = config.guild;
    let client_id = config.client_id;

    let library = TrackLibrary::open(library::default_data_dir()?)?;
    info!("Track library holds {} track(s)", library.len().await);

    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // Library commands
        upload(),
        rename(),
        delete(),
        tracks(),
        // Playback commands
        play(),
        pause(),
        stop(),
    ];

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                // Single-guild bot: commands only exist in the configured guild.
                poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                    .await?;
                Ok(Data { config, library })
            })
        });

    let mut client = ClientBuilder::new(token, intents)
        .framework(framework.build())
        .event_handler(events::Handler { client_id })
        .register_songbird()
        .await?;

    client.start().await.map_err(Into::into)
}
