use tracing::warn;

use super::*;
use crate::commands::{error, success};
use crate::player::{PlayerError, PlayerManager};

/// Stop playback and leave the voice channel
#[poise::command(
    slash_command,
    guild_only,
    check = "crate::authorized",
    category = "Playback"
)]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| Box::new(PlayerError::NotInGuild) as crate::Error)?;

    let stopped = PlayerManager::stop(guild_id).await;

    // Leave even when nothing was playing, so a lingering connection is
    // cleaned up either way.
    if let Err(e) = PlayerManager::leave_channel(ctx.serenity_context(), guild_id).await {
        if !matches!(e, PlayerError::NotConnected) {
            warn!("Failed to leave voice channel during stop: {e}");
        }
    }

    match stopped {
        Ok(title) => {
            ctx.send(success("⏹️ Stopped", format!("Stopped **{title}**")))
                .await?;
        }
        Err(PlayerError::NothingPlaying) => {
            ctx.send(error("No track is currently playing")).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
