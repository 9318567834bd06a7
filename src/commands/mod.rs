//! Slash commands, grouped by concern.

/// Playback controls over the active voice session.
pub(crate) mod playback;
/// Management of the stored track library.
pub(crate) mod tracks;

use poise::serenity_prelude::CreateEmbed;
use poise::CreateReply;

/// Green embed for a completed operation.
pub(crate) fn success(title: &str, description: impl Into<String>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title.to_owned())
            .description(description.into())
            .color(0x00ff00),
    )
}

/// Red ephemeral embed for a failed operation.
pub(crate) fn error(description: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description.into())
                .color(0xff0000),
        )
        .ephemeral(true)
}
