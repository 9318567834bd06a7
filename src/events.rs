//! Raw gateway events: the startup banner and the empty-channel
//! auto-disconnect.

use serenity::async_trait;
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::model::voice::VoiceState;
use serenity::prelude::*;
use tracing::{error, info};

use crate::player::PlayerManager;

pub struct Handler {
    /// Application ID from the config, used only for the invite URL log.
    pub client_id: Option<u64>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(" --------------------");
        info!(" Soundtrack v{}", env!("CARGO_PKG_VERSION"));
        info!("    © 2023 Krafter");
        info!("    MIT License");
        info!(" --------------------");
        info!("Logged in as {}", ready.user.name);

        if let Some(client_id) = self.client_id {
            info!(
                "Invite: https://discord.com/api/oauth2/authorize?client_id={client_id}&permissions=3147776&scope=bot%20applications.commands"
            );
        }
    }

    /// Disconnect when the bot is left alone in its voice channel.
    async fn voice_state_update(&self, ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        let Some(guild_id) = new.guild_id else { return };
        let Some(manager) = songbird::get(&ctx).await else {
            return;
        };

        // The bot's own updates: an admin force-disconnect would otherwise
        // leave the session (and a pending loop timer) dangling.
        if new.user_id == ctx.cache.current_user().id {
            if new.channel_id.is_none() {
                info!("Removed from voice in guild {guild_id}, clearing playback session");
                PlayerManager::clear(guild_id).await;
                if manager.get(guild_id).is_some() {
                    if let Err(e) = manager.remove(guild_id).await {
                        error!("Failed to drop voice handler after disconnect: {e}");
                    }
                }
            }
            return;
        }
        let Some(call) = manager.get(guild_id) else {
            return;
        };
        let Some(channel) = call.lock().await.current_channel() else {
            return;
        };
        let channel_id = ChannelId::new(channel.0.get());

        let bot_id = ctx.cache.current_user().id;
        let alone = {
            let Some(guild) = ctx.cache.guild(guild_id) else {
                return;
            };
            !guild
                .voice_states
                .values()
                .any(|state| state.user_id != bot_id && state.channel_id == Some(channel_id))
        };

        if alone {
            info!("Voice channel {channel_id} is empty, disconnecting");
            PlayerManager::clear(guild_id).await;
            if let Err(e) = manager.remove(guild_id).await {
                error!("Failed to leave empty voice channel: {e}");
            }
        }
    }
}
