use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, SessionDescription};
use std::fmt::Debug;
use tokio::sync::mpsc;

/// Состояние связности, о котором сообщает медиа-сессия.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Колбэки медиа-сессии, превращённые в сообщения для очереди владельца.
#[derive(Debug)]
pub enum MediaEvent<T> {
    Candidate(IceCandidate),
    RemoteTrack(T),
    Connectivity(ConnectivityState),
}

pub type MediaEventSender<T> = mpsc::UnboundedSender<MediaEvent<T>>;

/// Одно peer-to-peer соединение, предоставляемое внешней медиа-подсистемой.
#[async_trait]
pub trait MediaSession: Send + Sync + 'static {
    type LocalMedia: Send + Sync + 'static;

    async fn add_local_media(&self, media: &Self::LocalMedia) -> Result<()>;

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    /// Discards the pending local offer.
    async fn rollback(&self) -> Result<()>;

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Фабрика медиа-сессий и захват локального аудио/видео.
#[async_trait]
pub trait MediaCapability: Send + Sync + 'static {
    type LocalMedia: Send + Sync + 'static;
    type Track: Debug + Send + 'static;
    type Session: MediaSession<LocalMedia = Self::LocalMedia>;

    async fn capture(&self) -> Result<Self::LocalMedia>;

    async fn create_session(
        &self,
        ice_servers: &[IceServerConfig],
        events: MediaEventSender<Self::Track>,
    ) -> Result<Self::Session>;
}
