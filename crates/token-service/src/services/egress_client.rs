//! Egress (recording and streaming) client.
//!
//! Wraps `livekit.Egress` on the media server admin API. Recording and
//! streaming both start a room-composite egress; they differ only in the
//! output (an MP4 file or an RTMP stream).

use crate::errors::TsError;
use crate::services::twirp::TwirpClient;
use common::jwt::VideoGrant;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Twirp service name for egress.
const EGRESS_SERVICE: &str = "livekit.Egress";

/// Recording path used when the caller does not give one.
pub fn default_recording_path(room: &str) -> String {
    format!("/recordings/{room}.mp4")
}

#[derive(Debug, Serialize)]
struct EncodedFileOutput<'a> {
    file_type: &'static str,
    filepath: &'a str,
}

#[derive(Debug, Serialize)]
struct StreamOutput<'a> {
    protocol: &'static str,
    urls: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct RoomCompositeEgressRequest<'a> {
    room_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<EncodedFileOutput<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<StreamOutput<'a>>,
}

#[derive(Debug, Serialize)]
struct StopEgressRequest<'a> {
    egress_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct EgressInfo {
    #[serde(default)]
    egress_id: String,
}

/// Egress administration against the media server.
#[derive(Clone)]
pub struct EgressClient {
    twirp: TwirpClient,
}

impl EgressClient {
    pub fn new(twirp: TwirpClient) -> Self {
        Self { twirp }
    }

    async fn start_room_composite(
        &self,
        request: &RoomCompositeEgressRequest<'_>,
    ) -> Result<String, TsError> {
        let info: EgressInfo = self
            .twirp
            .call(
                EGRESS_SERVICE,
                "StartRoomCompositeEgress",
                VideoGrant::room_record(),
                request,
            )
            .await?;

        Ok(info.egress_id)
    }

    /// Record `room` to an MP4 file at `output_path`. Returns the egress id.
    ///
    /// # Errors
    ///
    /// `TsError::Upstream` if the admin API call fails.
    #[instrument(skip_all, fields(room = %room))]
    pub async fn start_recording(&self, room: &str, output_path: &str) -> Result<String, TsError> {
        let egress_id = self
            .start_room_composite(&RoomCompositeEgressRequest {
                room_name: room,
                file: Some(EncodedFileOutput {
                    file_type: "MP4",
                    filepath: output_path,
                }),
                stream: None,
            })
            .await?;

        info!(
            target: "ts.services.egress_client",
            room = %room,
            egress_id = %egress_id,
            output_path = %output_path,
            "Recording started"
        );

        Ok(egress_id)
    }

    /// Stream `room` to `rtmp_url`. Returns the egress id.
    ///
    /// # Errors
    ///
    /// `TsError::Upstream` if the admin API call fails.
    #[instrument(skip_all, fields(room = %room))]
    pub async fn start_streaming(&self, room: &str, rtmp_url: &str) -> Result<String, TsError> {
        let egress_id = self
            .start_room_composite(&RoomCompositeEgressRequest {
                room_name: room,
                file: None,
                stream: Some(StreamOutput {
                    protocol: "RTMP",
                    urls: [rtmp_url],
                }),
            })
            .await?;

        // Stream keys live in the URL; do not log it.
        info!(target: "ts.services.egress_client", room = %room, egress_id = %egress_id, "Streaming started");

        Ok(egress_id)
    }

    /// Stop a running egress.
    ///
    /// # Errors
    ///
    /// `TsError::Upstream` if the admin API call fails (including an unknown
    /// egress id).
    #[instrument(skip_all, fields(egress_id = %egress_id))]
    pub async fn stop_egress(&self, egress_id: &str) -> Result<(), TsError> {
        let _: serde::de::IgnoredAny = self
            .twirp
            .call(
                EGRESS_SERVICE,
                "StopEgress",
                VideoGrant::room_record(),
                &StopEgressRequest { egress_id },
            )
            .await?;

        info!(target: "ts.services.egress_client", egress_id = %egress_id, "Egress stopped");

        Ok(())
    }
}

/// Trait for egress operations (enables mocking).
#[async_trait::async_trait]
pub trait EgressServiceTrait: Send + Sync {
    async fn start_recording(&self, room: &str, output_path: &str) -> Result<String, TsError>;

    async fn start_streaming(&self, room: &str, rtmp_url: &str) -> Result<String, TsError>;

    async fn stop_egress(&self, egress_id: &str) -> Result<(), TsError>;
}

#[async_trait::async_trait]
impl EgressServiceTrait for EgressClient {
    async fn start_recording(&self, room: &str, output_path: &str) -> Result<String, TsError> {
        self.start_recording(room, output_path).await
    }

    async fn start_streaming(&self, room: &str, rtmp_url: &str) -> Result<String, TsError> {
        self.start_streaming(room, rtmp_url).await
    }

    async fn stop_egress(&self, egress_id: &str) -> Result<(), TsError> {
        self.stop_egress(egress_id).await
    }
}

/// Mock egress client module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock egress client for handler tests.
    pub struct MockEgressClient {
        egress_id: String,
        error: Option<String>,
        call_count: AtomicUsize,
        last_output: Mutex<Option<String>>,
        last_stopped: Mutex<Option<String>>,
    }

    impl MockEgressClient {
        /// Create a mock that starts egress `EG_mock`.
        pub fn accepting() -> Self {
            Self::with_egress_id("EG_mock")
        }

        /// Create a mock that starts egress `egress_id`.
        pub fn with_egress_id(egress_id: &str) -> Self {
            Self {
                egress_id: egress_id.to_string(),
                error: None,
                call_count: AtomicUsize::new(0),
                last_output: Mutex::new(None),
                last_stopped: Mutex::new(None),
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

        /// Output path or RTMP URL passed to the most recent start call.
        pub fn last_output(&self) -> Option<String> {
            self.last_output.lock().ok().and_then(|guard| guard.clone())
        }

        /// Egress id passed to the most recent `stop_egress`.
        pub fn last_stopped(&self) -> Option<String> {
            self.last_stopped.lock().ok().and_then(|guard| guard.clone())
        }

        fn start(&self, output: &str) -> Result<String, TsError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut guard) = self.last_output.lock() {
                *guard = Some(output.to_string());
            }

            match &self.error {
                Some(message) => Err(TsError::Upstream(message.clone())),
                None => Ok(self.egress_id.clone()),
            }
        }
    }

    #[async_trait::async_trait]
    impl EgressServiceTrait for MockEgressClient {
        async fn start_recording(&self, _room: &str, output_path: &str) -> Result<String, TsError> {
            self.start(output_path)
        }

        async fn start_streaming(&self, _room: &str, rtmp_url: &str) -> Result<String, TsError> {
            self.start(rtmp_url)
        }

        async fn stop_egress(&self, egress_id: &str) -> Result<(), TsError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut guard) = self.last_stopped.lock() {
                *guard = Some(egress_id.to_string());
            }

            match &self.error {
                Some(message) => Err(TsError::Upstream(message.clone())),
                None => Ok(()),
            }
        }
    }
}
