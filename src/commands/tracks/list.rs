use poise::serenity_prelude::CreateEmbed;
use poise::CreateReply;

use super::*;

/// List the stored track sets
#[poise::command(slash_command, guild_only, category = "Tracks")]
pub async fn tracks(ctx: Context<'_>) -> CommandResult {
    let entries = ctx.data().library.entries().await;

    if entries.is_empty() {
        ctx.say("No tracks uploaded yet. Use `/upload` to add one.")
            .await?;
        return Ok(());
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|(title, entry)| format!("**{title}** — loop starts {}", describe_delay(entry.delay)))
        .collect();

    ctx.send(
        CreateReply::default().embed(
            CreateEmbed::new()
                .title("🎵 Track Library")
                .description(lines.join("\n"))
                .color(0x00ff00),
        ),
    )
    .await?;

    Ok(())
}
