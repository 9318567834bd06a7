use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use poise::serenity_prelude as serenity;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::File;
use songbird::tracks::{LoopState, PlayMode, Track, TrackHandle};
use songbird::{Call, Event, Songbird, TrackEvent};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::library::TrackEntry;
use crate::player::events::IntroEndNotifier;

/// Errors that can occur during playback operations
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Track control failed: {0}")]
    TrackError(#[from] songbird::error::ControlError),
}

/// Result type for playback operations
pub type PlayerResult<T> = Result<T, PlayerError>;

/// Where an active session currently is in the intro/loop sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// The intro track is playing.
    Intro,
    /// The intro has ended; waiting out the configured delay.
    LoopDelay,
    /// The loop track is repeating.
    Looping,
}

/// Outcome of a pause toggle.
pub enum PauseToggle {
    Paused(String),
    Resumed(String),
}

pub struct Session {
    pub title: String,
    pub phase: PlaybackPhase,
    // Absent during the LoopDelay gap between tracks.
    handle: Option<TrackHandle>,
    delay_task: Option<JoinHandle<()>>,
    // Distinguishes this session from any later one for the same guild,
    // so a stale intro-end callback or delay task cannot start a loop
    // over a newer session.
    epoch: u64,
}

/// Manages voice connections and per-guild playback sessions
pub struct PlayerManager {
    sessions: HashMap<GuildId, Session>,
    next_epoch: u64,
}

pub static PLAYER_MANAGER: LazyLock<Arc<Mutex<PlayerManager>>> =
    LazyLock::new(|| Arc::new(Mutex::new(PlayerManager::new())));

impl PlayerManager {
    fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_epoch: 0,
        }
    }

    /// Get the Songbird voice client from the context
    pub async fn get_songbird(ctx: &Context) -> PlayerResult<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or(PlayerError::NoVoiceManager)
    }

    /// Get the current voice channel call handle
    pub async fn get_call(
        ctx: &Context,
        guild_id: GuildId,
    ) -> PlayerResult<Arc<SerenityMutex<Call>>> {
        let songbird = Self::get_songbird(ctx).await?;
        songbird.get(guild_id).ok_or(PlayerError::NotConnected)
    }

    /// Join a voice channel
    pub async fn join_channel(
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> PlayerResult<Arc<SerenityMutex<Call>>> {
        let songbird = Self::get_songbird(ctx).await?;
        songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| PlayerError::JoinError(e.to_string()))
    }

    /// Leave a voice channel
    pub async fn leave_channel(ctx: &Context, guild_id: GuildId) -> PlayerResult<()> {
        let songbird = Self::get_songbird(ctx).await?;
        if songbird.get(guild_id).is_none() {
            return Err(PlayerError::NotConnected);
        }
        songbird
            .remove(guild_id)
            .await
            .map_err(|e| PlayerError::JoinError(e.to_string()))
    }

    /// Get the voice channel ID that the user is currently in
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: serenity::UserId,
    ) -> PlayerResult<ChannelId> {
        let guild = ctx.cache.guild(guild_id).ok_or(PlayerError::NotInGuild)?;
        guild
            .voice_states
            .get(&user_id)
            .and_then(|state| state.channel_id)
            .ok_or(PlayerError::UserNotInVoiceChannel)
    }

    /// Start an intro/loop session, replacing any session already active
    /// for this guild. The loop continuation is driven by the intro's
    /// track-end event.
    pub async fn start(
        guild_id: GuildId,
        call: Arc<SerenityMutex<Call>>,
        title: String,
        entry: &TrackEntry,
        delay: Duration,
    ) -> PlayerResult<()> {
        // Hold the manager lock until the session is stored, so the intro's
        // end event (which takes this lock first) cannot observe a missing
        // session even for a near-empty intro file.
        let mut manager = PLAYER_MANAGER.lock().await;
        if let Some(old) = manager.stop_session(&guild_id) {
            debug!("Replacing active session '{}' in guild {guild_id}", old.title);
        }
        let epoch = manager.allocate_epoch();

        info!("Starting intro '{}' for guild {guild_id}", title);
        let intro = Track::new(File::new(entry.intro.clone()).into());
        let handle = call.lock().await.play(intro);

        handle.add_event(
            Event::Track(TrackEvent::End),
            IntroEndNotifier {
                guild_id,
                call: call.clone(),
                loop_file: entry.loop_file.clone(),
                delay,
                epoch,
            },
        )?;

        manager.sessions.insert(
            guild_id,
            Session {
                title,
                phase: PlaybackPhase::Intro,
                handle: Some(handle),
                delay_task: None,
                epoch,
            },
        );

        Ok(())
    }

    /// Begin the infinite loop pass for the session identified by `epoch`.
    /// A no-op when that session has since been stopped or replaced.
    pub(crate) async fn begin_loop(
        guild_id: GuildId,
        call: Arc<SerenityMutex<Call>>,
        loop_file: PathBuf,
        epoch: u64,
    ) {
        {
            let manager = PLAYER_MANAGER.lock().await;
            match manager.sessions.get(&guild_id) {
                Some(session) if session.epoch == epoch => {}
                _ => {
                    debug!("Dropping stale loop start for guild {guild_id}");
                    return;
                }
            }
        }

        info!("Starting loop track for guild {guild_id}");
        let track = Track::new(File::new(loop_file).into()).loops(LoopState::Infinite);
        let handle = call.lock().await.play(track);

        let mut manager = PLAYER_MANAGER.lock().await;
        match manager.sessions.get_mut(&guild_id) {
            Some(session) if session.epoch == epoch => {
                session.handle = Some(handle);
                session.phase = PlaybackPhase::Looping;
                session.delay_task = None;
            }
            // Stopped while we were starting the loop track.
            _ => {
                let _ = handle.stop();
            }
        }
    }

    /// Toggle pause/resume on the active track. During the delay gap there
    /// is no active track, which reads as nothing playing.
    pub async fn toggle_pause(guild_id: GuildId) -> PlayerResult<PauseToggle> {
        let (handle, title) = {
            let manager = PLAYER_MANAGER.lock().await;
            let session = manager
                .sessions
                .get(&guild_id)
                .ok_or(PlayerError::NothingPlaying)?;
            let handle = session
                .handle
                .clone()
                .ok_or(PlayerError::NothingPlaying)?;
            (handle, session.title.clone())
        };

        let info = handle
            .get_info()
            .await
            .map_err(|_| PlayerError::NothingPlaying)?;

        match info.playing {
            PlayMode::Play => {
                handle.pause()?;
                Ok(PauseToggle::Paused(title))
            }
            PlayMode::Pause => {
                handle.play()?;
                Ok(PauseToggle::Resumed(title))
            }
            _ => Err(PlayerError::NothingPlaying),
        }
    }

    /// Stop the active session, returning its title.
    pub async fn stop(guild_id: GuildId) -> PlayerResult<String> {
        let mut manager = PLAYER_MANAGER.lock().await;
        manager
            .stop_session(&guild_id)
            .map(|session| session.title)
            .ok_or(PlayerError::NothingPlaying)
    }

    /// Drop session state without an error when none exists. Used after the
    /// voice connection is already gone (auto-disconnect).
    pub async fn clear(guild_id: GuildId) {
        let mut manager = PLAYER_MANAGER.lock().await;
        manager.stop_session(&guild_id);
    }

    /// Title and phase of the active session, if any.
    pub async fn current(guild_id: GuildId) -> Option<(String, PlaybackPhase)> {
        let manager = PLAYER_MANAGER.lock().await;
        manager
            .sessions
            .get(&guild_id)
            .map(|session| (session.title.clone(), session.phase))
    }

    pub(crate) fn session_epoch(&self, guild_id: &GuildId) -> Option<u64> {
        self.sessions.get(guild_id).map(|session| session.epoch)
    }

    pub(crate) fn session_mut(&mut self, guild_id: &GuildId) -> Option<&mut Session> {
        self.sessions.get_mut(guild_id)
    }

    fn allocate_epoch(&mut self) -> u64 {
        self.next_epoch += 1;
        self.next_epoch
    }

    /// Tear down a session: abort a pending delay task and stop the track.
    fn stop_session(&mut self, guild_id: &GuildId) -> Option<Session> {
        let mut session = self.sessions.remove(guild_id)?;
        if let Some(task) = session.delay_task.take() {
            task.abort();
        }
        if let Some(handle) = session.handle.take() {
            let _ = handle.stop();
        }
        debug!("Cleared session '{}' for guild {guild_id}", session.title);
        Some(session)
    }
}

impl Session {
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn enter_delay(&mut self) {
        self.phase = PlaybackPhase::LoopDelay;
        self.handle = None;
    }

    pub(crate) fn set_delay_task(&mut self, task: JoinHandle<()>) {
        self.delay_task = Some(task);
    }
}
