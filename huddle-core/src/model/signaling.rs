use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// События от клиента к серверу.
///
/// `S` — тип полезной нагрузки сигнала. Сервер работает с `serde_json::Value`
/// и никогда не заглядывает внутрь, клиент подставляет типизированный `SignalPayload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent<S = Value> {
    JoinRoom {
        room: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        participant: Option<PeerId>,
    },
    Signal {
        to: PeerId,
        signal: S,
    },
    LeaveRoom,
}

/// События от сервера к клиенту.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent<S = Value> {
    Welcome {
        participant: PeerId,
        ice_servers: Vec<IceServerConfig>,
    },
    ExistingUsers(Vec<PeerId>),
    UserConnected(PeerId),
    Signal {
        from: PeerId,
        signal: S,
    },
    UserDisconnected(PeerId),
    Error {
        message: String,
    },
}
