use super::*;
use crate::commands::{error, success};
use crate::player::{PauseToggle, PlayerError, PlayerManager};

/// Pause or resume the current track
#[poise::command(
    slash_command,
    guild_only,
    check = "crate::authorized",
    category = "Playback"
)]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| Box::new(PlayerError::NotInGuild) as crate::Error)?;

    match PlayerManager::toggle_pause(guild_id).await {
        Ok(PauseToggle::Paused(title)) => {
            ctx.send(success("⏸️ Paused", format!("Paused **{title}**")))
                .await?;
        }
        Ok(PauseToggle::Resumed(title)) => {
            ctx.send(success("▶️ Resumed", format!("Resumed **{title}**")))
                .await?;
        }
        Err(PlayerError::NothingPlaying) => {
            ctx.send(error("No track is currently playing")).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
