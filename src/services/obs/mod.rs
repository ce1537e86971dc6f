//! Streaming Application Resources
//!
//! Typed wrappers over [`RpcClient`](crate::services::rpc::RpcClient) for the
//! resources bot commands and components use most: audio sources and scenes.

pub mod audio;
pub mod scenes;

pub use audio::{AudioService, AudioSource, Fader};
pub use scenes::{Scene, SceneNode, ScenesService};
