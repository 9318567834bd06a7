use std::time::Duration;

use tracing::info;

use super::*;
use crate::commands::tracks::{autocomplete_track, describe_delay};
use crate::commands::{error, success};
use crate::player::{PlayerError, PlayerManager};

/// Play a stored track set in your voice channel
#[poise::command(
    slash_command,
    guild_only,
    check = "crate::authorized",
    category = "Playback"
)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "The track to play"]
    #[autocomplete = "autocomplete_track"]
    name: String,
    #[description = "Override the stored loop delay (seconds)"]
    #[min = 0]
    delay: Option<f64>,
) -> CommandResult {
    info!("Play command for '{}' from {}", name, ctx.author().name);
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| Box::new(PlayerError::NotInGuild) as crate::Error)?;

    let Some(entry) = ctx.data().library.entry(&name).await else {
        ctx.send(error(format!("No track named **{name}**"))).await?;
        return Ok(());
    };

    // The caller must be in a voice channel for the bot to join.
    let channel_id = match PlayerManager::get_user_voice_channel(
        ctx.serenity_context(),
        guild_id,
        ctx.author().id,
    ) {
        Ok(channel_id) => channel_id,
        Err(err) => {
            ctx.send(error(format!("You need to be in a voice channel: {err}")))
                .await?;
            return Ok(());
        }
    };

    ctx.defer().await?;

    // Reuse an existing connection, or join the caller's channel.
    let call = match PlayerManager::get_call(ctx.serenity_context(), guild_id).await {
        Ok(call) => call,
        Err(_) => {
            match PlayerManager::join_channel(ctx.serenity_context(), guild_id, channel_id).await {
                Ok(call) => call,
                Err(err) => {
                    ctx.send(error(format!("Failed to join voice channel: {err}")))
                        .await?;
                    return Ok(());
                }
            }
        }
    };

    let delay = delay.map(Duration::from_secs_f64).unwrap_or(entry.delay);
    PlayerManager::start(guild_id, call, name.clone(), &entry, delay).await?;

    ctx.send(success(
        "🎵 Now Playing",
        format!("**{name}** — the loop starts {}", describe_delay(delay)),
    ))
    .await?;

    Ok(())
}
