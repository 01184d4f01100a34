//! Room administration client.
//!
//! Wraps `livekit.RoomService` on the media server admin API: create rooms,
//! list participants, remove participants. Each call is authorized by a
//! service token carrying only the grant that method needs.

use crate::errors::TsError;
use crate::services::twirp::TwirpClient;
use common::jwt::VideoGrant;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, instrument};

/// Twirp service name for room administration.
const ROOM_SERVICE: &str = "livekit.RoomService";

/// Seconds an empty room is kept before the media server closes it.
pub const DEFAULT_EMPTY_TIMEOUT_SECS: u32 = 300;

/// Participant cap applied when the caller does not give one.
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 10;

/// Parameters for creating a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRoomOptions {
    pub name: String,
    pub empty_timeout: u32,
    pub max_participants: u32,
}

impl CreateRoomOptions {
    /// Options for `name` with the default timeout and participant cap.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            empty_timeout: DEFAULT_EMPTY_TIMEOUT_SECS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
        }
    }
}

/// A room as reported by the media server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sid: String,
}

/// Connection state of a participant.
///
/// Rendered with the media server's enum names. The admin API may report
/// the state as a name, as its numeric value, or omit it when it is the
/// zero value (`JOINING`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParticipantState {
    #[default]
    Joining,
    Joined,
    Active,
    Disconnected,
}

impl ParticipantState {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantState::Joining => "JOINING",
            ParticipantState::Joined => "JOINED",
            ParticipantState::Active => "ACTIVE",
            ParticipantState::Disconnected => "DISCONNECTED",
        }
    }

    /// Map the numeric form. Unknown values fall back to `JOINING`.
    pub fn from_number(value: i64) -> Self {
        match value {
            1 => ParticipantState::Joined,
            2 => ParticipantState::Active,
            3 => ParticipantState::Disconnected,
            _ => ParticipantState::Joining,
        }
    }

    /// Map the name form. Unknown names fall back to `JOINING`.
    pub fn from_name(value: &str) -> Self {
        match value {
            "JOINED" => ParticipantState::Joined,
            "ACTIVE" => ParticipantState::Active,
            "DISCONNECTED" => ParticipantState::Disconnected,
            _ => ParticipantState::Joining,
        }
    }
}

impl Serialize for ParticipantState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParticipantState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Name(String),
            Number(i64),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Name(name)) => ParticipantState::from_name(&name),
            Some(Raw::Number(n)) => ParticipantState::from_number(n),
            None => ParticipantState::Joining,
        })
    }
}

/// A participant in a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    #[serde(default)]
    pub sid: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: ParticipantState,
}

#[derive(Debug, Serialize)]
struct ListParticipantsRequest<'a> {
    room: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ListParticipantsResponse {
    #[serde(default)]
    participants: Vec<ParticipantInfo>,
}

#[derive(Debug, Serialize)]
struct RemoveParticipantRequest<'a> {
    room: &'a str,
    identity: &'a str,
}

/// Room administration against the media server.
#[derive(Clone)]
pub struct RoomClient {
    twirp: TwirpClient,
}

impl RoomClient {
    pub fn new(twirp: TwirpClient) -> Self {
        Self { twirp }
    }

    /// Create a room.
    ///
    /// # Errors
    ///
    /// `TsError::Upstream` if the admin API call fails.
    #[instrument(skip_all, fields(room = %options.name))]
    pub async fn create_room(&self, options: &CreateRoomOptions) -> Result<RoomInfo, TsError> {
        let room: RoomInfo = self
            .twirp
            .call(ROOM_SERVICE, "CreateRoom", VideoGrant::room_create(), options)
            .await?;

        info!(target: "ts.services.room_client", room = %room.name, sid = %room.sid, "Room created");

        Ok(room)
    }

    /// List the participants currently in `room`.
    ///
    /// # Errors
    ///
    /// `TsError::Upstream` if the admin API call fails.
    #[instrument(skip_all, fields(room = %room))]
    pub async fn list_participants(&self, room: &str) -> Result<Vec<ParticipantInfo>, TsError> {
        let response: ListParticipantsResponse = self
            .twirp
            .call(
                ROOM_SERVICE,
                "ListParticipants",
                VideoGrant::room_admin(room),
                &ListParticipantsRequest { room },
            )
            .await?;

        Ok(response.participants)
    }

    /// Remove `identity` from `room`.
    ///
    /// # Errors
    ///
    /// `TsError::Upstream` if the admin API call fails (including an unknown
    /// participant).
    #[instrument(skip_all, fields(room = %room, identity = %identity))]
    pub async fn remove_participant(&self, room: &str, identity: &str) -> Result<(), TsError> {
        let _: serde::de::IgnoredAny = self
            .twirp
            .call(
                ROOM_SERVICE,
                "RemoveParticipant",
                VideoGrant::room_admin(room),
                &RemoveParticipantRequest { room, identity },
            )
            .await?;

        info!(target: "ts.services.room_client", room = %room, identity = %identity, "Participant removed");

        Ok(())
    }
}

/// Trait for room administration (enables mocking).
#[async_trait::async_trait]
pub trait RoomServiceTrait: Send + Sync {
    async fn create_room(&self, options: &CreateRoomOptions) -> Result<RoomInfo, TsError>;

    async fn list_participants(&self, room: &str) -> Result<Vec<ParticipantInfo>, TsError>;

    async fn remove_participant(&self, room: &str, identity: &str) -> Result<(), TsError>;
}

#[async_trait::async_trait]
impl RoomServiceTrait for RoomClient {
    async fn create_room(&self, options: &CreateRoomOptions) -> Result<RoomInfo, TsError> {
        self.create_room(options).await
    }

    async fn list_participants(&self, room: &str) -> Result<Vec<ParticipantInfo>, TsError> {
        self.list_participants(room).await
    }

    async fn remove_participant(&self, room: &str, identity: &str) -> Result<(), TsError> {
        self.remove_participant(room, identity).await
    }
}

/// Mock room client module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock room client for handler tests.
    pub struct MockRoomClient {
        participants: Vec<ParticipantInfo>,
        error: Option<String>,
        call_count: AtomicUsize,
        last_create: Mutex<Option<CreateRoomOptions>>,
        last_removed: Mutex<Option<(String, String)>>,
    }

    impl MockRoomClient {
        /// Create a mock that succeeds with an empty room.
        pub fn accepting() -> Self {
            Self::with_participants(vec![])
        }

        /// Create a mock that reports `participants` for every room.
        pub fn with_participants(participants: Vec<ParticipantInfo>) -> Self {
            Self {
                participants,
                error: None,
                call_count: AtomicUsize::new(0),
                last_create: Mutex::new(None),
                last_removed: Mutex::new(None),
            }
        }

        /// Create a mock whose calls fail with an upstream `message`.
        pub fn failing(message: &str) -> Self {
            Self {
                error: Some(message.to_string()),
                ..Self::accepting()
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Options passed to the most recent `create_room`.
        pub fn last_create(&self) -> Option<CreateRoomOptions> {
            self.last_create.lock().ok().and_then(|guard| guard.clone())
        }

        /// `(room, identity)` passed to the most recent `remove_participant`.
        pub fn last_removed(&self) -> Option<(String, String)> {
            self.last_removed.lock().ok().and_then(|guard| guard.clone())
        }

        fn begin_call(&self) -> Result<(), TsError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match &self.error {
                Some(message) => Err(TsError::Upstream(message.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait::async_trait]
    impl RoomServiceTrait for MockRoomClient {
        async fn create_room(&self, options: &CreateRoomOptions) -> Result<RoomInfo, TsError> {
            if let Ok(mut guard) = self.last_create.lock() {
                *guard = Some(options.clone());
            }
            self.begin_call()?;

            Ok(RoomInfo {
                name: options.name.clone(),
                sid: format!("RM_{}", options.name),
            })
        }

        async fn list_participants(&self, _room: &str) -> Result<Vec<ParticipantInfo>, TsError> {
            self.begin_call()?;
            Ok(self.participants.clone())
        }

        async fn remove_participant(&self, room: &str, identity: &str) -> Result<(), TsError> {
            if let Ok(mut guard) = self.last_removed.lock() {
                *guard = Some((room.to_string(), identity.to_string()));
            }
            self.begin_call()
        }
    }
}
