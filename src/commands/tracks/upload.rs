use std::time::Duration;

use poise::serenity_prelude::Attachment;
use tracing::{info, warn};

use super::*;
use crate::commands::{error, success};
use crate::library::LibraryError;

fn is_mp3(attachment: &Attachment) -> bool {
    attachment
        .content_type
        .as_deref()
        .is_some_and(|t| t.starts_with("audio/mpeg"))
        || attachment.filename.to_lowercase().ends_with(".mp3")
}

/// Upload a track set: an intro played once and a loop repeated after it
#[poise::command(
    slash_command,
    guild_only,
    check = "crate::authorized",
    category = "Tracks"
)]
pub async fn upload(
    ctx: Context<'_>,
    #[description = "The title for this track set"]
    #[min_length = 3]
    #[max_length = 15]
    name: String,
    #[description = "Track to play at the start"] intro: Attachment,
    #[description = "Track to loop once the intro ends"]
    #[rename = "loop"]
    loop_track: Attachment,
    #[description = "Seconds of silence before the loop starts"]
    #[min = 0]
    delay: Option<f64>,
) -> CommandResult {
    info!("Upload request for '{}' from {}", name, ctx.author().name);

    for attachment in [&intro, &loop_track] {
        if !is_mp3(attachment) {
            warn!("Rejected non-MP3 upload: {}", attachment.filename);
            ctx.send(error(format!(
                "`{}` is not an MP3 file; both tracks must be MP3",
                attachment.filename
            )))
            .await?;
            return Ok(());
        }
    }

    // Downloading two attachments can take a while.
    ctx.defer().await?;

    let intro_bytes = intro.download().await?;
    let loop_bytes = loop_track.download().await?;
    let delay = Duration::from_secs_f64(delay.unwrap_or(0.0));

    match ctx
        .data()
        .library
        .add(&name, &intro_bytes, &loop_bytes, delay)
        .await
    {
        Ok(entry) => {
            info!("Stored track set '{}'", name);
            ctx.send(success(
                "🎵 Track Uploaded",
                format!(
                    "**{name}** — the loop starts {}",
                    describe_delay(entry.delay)
                ),
            ))
            .await?;
        }
        Err(
            e @ (LibraryError::DuplicateTitle(_)
            | LibraryError::SlugCollision { .. }
            | LibraryError::InvalidTitle(_)),
        ) => {
            ctx.send(error(e.to_string())).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
