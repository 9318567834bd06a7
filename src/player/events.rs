use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::prelude::Mutex as SerenityMutex;
use songbird::Call;
use tracing::{debug, info};

use crate::player::manager::{PlayerManager, PLAYER_MANAGER};

/// Fires when the intro track finishes: waits out the configured delay,
/// then hands the guild over to the loop track.
pub struct IntroEndNotifier {
    pub guild_id: serenity::GuildId,
    pub call: Arc<SerenityMutex<Call>>,
    pub loop_file: PathBuf,
    pub delay: Duration,
    pub epoch: u64,
}

#[async_trait]
impl songbird::EventHandler for IntroEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(_) = ctx {
            self.intro_finished().await;
        }
        None
    }
}

impl IntroEndNotifier {
    async fn intro_finished(&self) {
        info!("Intro ended for guild {}", self.guild_id);

        // Flip the session into the delay gap; bail if it was stopped or
        // replaced while the intro was still playing.
        {
            let mut manager = PLAYER_MANAGER.lock().await;
            match manager.session_mut(&self.guild_id) {
                Some(session) if session.epoch() == self.epoch => {
                    session.enter_delay();
                }
                _ => {
                    debug!("Ignoring intro end for stale session in guild {}", self.guild_id);
                    return;
                }
            }
        }

        let guild_id = self.guild_id;
        let call = self.call.clone();
        let loop_file = self.loop_file.clone();
        let delay = self.delay;
        let epoch = self.epoch;

        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                debug!("Delaying loop start by {delay:?} for guild {guild_id}");
                tokio::time::sleep(delay).await;
            }
            PlayerManager::begin_loop(guild_id, call, loop_file, epoch).await;
        });

        // Store the task so /stop can abort a pending delay. If the session
        // disappeared in the meantime, the task must not run.
        let mut manager = PLAYER_MANAGER.lock().await;
        match manager.session_mut(&self.guild_id) {
            Some(session) if session.epoch() == self.epoch => {
                session.set_delay_task(task);
            }
            _ => task.abort(),
        }
    }
}
