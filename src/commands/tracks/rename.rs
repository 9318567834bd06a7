use tracing::info;

use super::*;
use crate::commands::{error, success};
use crate::library::LibraryError;

/// Rename a stored track set
#[poise::command(
    slash_command,
    guild_only,
    check = "crate::authorized",
    category = "Tracks"
)]
pub async fn rename(
    ctx: Context<'_>,
    #[description = "The track to rename"]
    #[autocomplete = "autocomplete_track"]
    name: String,
    #[description = "The new title"]
    #[min_length = 3]
    #[max_length = 15]
    new_name: String,
) -> CommandResult {
    match ctx.data().library.rename(&name, &new_name).await {
        Ok(()) => {
            info!("Renamed track '{}' to '{}'", name, new_name);
            ctx.send(success(
                "✏️ Track Renamed",
                format!("**{name}** is now **{new_name}**"),
            ))
            .await?;
        }
        Err(
            e @ (LibraryError::NotFound(_)
            | LibraryError::DuplicateTitle(_)
            | LibraryError::SlugCollision { .. }
            | LibraryError::InvalidTitle(_)),
        ) => {
            ctx.send(error(e.to_string())).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
