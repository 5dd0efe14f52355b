use crate::directory::SessionDirectory;
use crate::engine::{ConnectionState, ParticipantEngine};
use crate::media::MediaCapability;
use crate::negotiation::{NegotiationConfig, SessionContext};
use huddle_core::utils::default_ice_servers;
use huddle_core::{IceServerConfig, PeerId, ServerEvent, SignalPayload};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl<C: MediaCapability> ParticipantEngine<C> {
    pub fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Welcome {
                participant,
                ice_servers,
            } => self.on_welcome(participant, ice_servers),

            ServerEvent::ExistingUsers(peers) => {
                info!("Room already has {} participant(s)", peers.len());
                let Some(directory) = self.directory.as_mut() else {
                    warn!("Received existing-users before welcome");
                    return;
                };
                for peer in &peers {
                    directory.ensure(peer, true);
                }
            }

            ServerEvent::UserConnected(peer) => {
                info!("Participant {} joined", peer);
                let Some(directory) = self.directory.as_mut() else {
                    warn!("Received user-connected before welcome");
                    return;
                };
                directory.ensure(&peer, false);
            }

            ServerEvent::Signal { from, signal } => {
                let payload = match serde_json::from_value::<SignalPayload>(signal) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Malformed signal from {}: {}", from, e);
                        return;
                    }
                };
                let Some(directory) = self.directory.as_mut() else {
                    warn!("Received signal from {} before welcome", from);
                    return;
                };
                directory.deliver(&from, payload);
            }

            ServerEvent::UserDisconnected(peer) => {
                info!("Participant {} left", peer);
                if let Some(directory) = self.directory.as_mut() {
                    if !directory.remove(&peer) {
                        debug!("No session with {} to close", peer);
                    }
                }
            }

            ServerEvent::Error { message } => {
                warn!("Relay reported an error: {}", message);
            }
        }
    }

    fn on_welcome(&mut self, participant: PeerId, relay_ice_servers: Vec<IceServerConfig>) {
        if self.directory.is_some() {
            warn!("Ignoring repeated welcome for {}", participant);
            return;
        }

        let ice_servers = match &self.config.ice_servers {
            Some(configured) => configured.clone(),
            None if !relay_ice_servers.is_empty() => relay_ice_servers,
            None => default_ice_servers(),
        };
        info!(
            "Joined room '{}' as {} ({} ICE server entries)",
            self.config.room,
            participant,
            ice_servers.len()
        );

        let ctx = SessionContext {
            local: participant,
            capability: Arc::clone(&self.capability),
            local_media: Arc::clone(&self.local_media),
            config: NegotiationConfig {
                ice_servers,
                max_ice_restarts: self.config.max_ice_restarts,
            },
            outbound: self.outbound.clone(),
            events: self.events.clone(),
        };
        self.directory = Some(SessionDirectory::new(ctx));
        self.state = ConnectionState::Connected;
    }
}
