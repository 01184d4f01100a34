//! Media server admin API clients.

pub mod egress_client;
pub mod room_client;
pub mod twirp;

pub use egress_client::{EgressClient, EgressServiceTrait};
pub use room_client::{RoomClient, RoomServiceTrait};
pub use twirp::TwirpClient;
