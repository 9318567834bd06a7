use tracing::info;

use super::*;
use crate::commands::{error, success};
use crate::library::LibraryError;

/// Delete a stored track set and its audio files
#[poise::command(
    slash_command,
    guild_only,
    check = "crate::authorized",
    category = "Tracks"
)]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "The track to delete"]
    #[autocomplete = "autocomplete_track"]
    name: String,
) -> CommandResult {
    match ctx.data().library.remove(&name).await {
        Ok(()) => {
            info!("Deleted track '{}'", name);
            ctx.send(success("🗑️ Track Deleted", format!("Removed **{name}**")))
                .await?;
        }
        Err(e @ LibraryError::NotFound(_)) => {
            ctx.send(error(e.to_string())).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
