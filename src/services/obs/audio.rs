//! Audio Sources

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::services::rpc::{RpcClient, RpcError};

/// Volume fader of an audio source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fader {
    pub db: f32,
    pub deflection: f32,
    pub mul: f32,
}

/// An audio source as reported by the streaming application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioSource {
    pub source_id: String,
    /// Address for calls on this source itself.
    pub resource_id: String,
    pub name: String,
    pub muted: bool,
    pub fader: Fader,
    pub audio_mixers: i32,
    pub force_mono: bool,
    pub monitoring_type: i32,
    pub sync_offset: i32,
}

/// The `AudioService` resource.
#[derive(Clone)]
pub struct AudioService {
    client: Arc<RpcClient>,
}

impl AudioService {
    pub const RESOURCE: &'static str = "AudioService";

    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    pub async fn get_sources(&self) -> Result<Vec<AudioSource>, RpcError> {
        self.client
            .call("getSources", Some(Self::RESOURCE), Vec::new())
            .await
    }

    /// Look up one source; `None` if the application does not know it.
    pub async fn get_source(&self, source_id: &str) -> Result<Option<AudioSource>, RpcError> {
        self.client
            .call("getSource", Some(Self::RESOURCE), vec![json!(source_id)])
            .await
    }

    pub async fn get_sources_for_current_scene(&self) -> Result<Vec<AudioSource>, RpcError> {
        self.client
            .call("getSourcesForCurrentScene", Some(Self::RESOURCE), Vec::new())
            .await
    }

    pub async fn get_sources_for_scene(&self, scene_id: &str) -> Result<Vec<AudioSource>, RpcError> {
        self.client
            .call("getSourcesForScene", Some(Self::RESOURCE), vec![json!(scene_id)])
            .await
    }

    pub async fn set_muted(&self, source: &AudioSource, muted: bool) -> Result<(), RpcError> {
        self.client
            .fire_and_forget("setMuted", Some(&source.resource_id), vec![json!(muted)])
            .await
    }

    /// Set the fader as a linear multiplier.
    pub async fn set_mul(&self, source: &AudioSource, mul: f32) -> Result<(), RpcError> {
        self.client
            .fire_and_forget("setMul", Some(&source.resource_id), vec![json!(mul)])
            .await
    }

    /// Set the fader position (0.0 to 1.0).
    pub async fn set_deflection(&self, source: &AudioSource, deflection: f32) -> Result<(), RpcError> {
        self.client
            .fire_and_forget("setDeflection", Some(&source.resource_id), vec![json!(deflection)])
            .await
    }
}
