//! Scenes

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::services::rpc::{RpcClient, RpcError};

/// One node of a scene: a source item or a folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneNode {
    pub id: String,
    pub resource_id: String,
    pub scene_id: String,
    /// `"item"` or `"folder"`.
    pub scene_node_type: String,
    pub name: String,
    pub source_id: Option<String>,
    pub scene_item_id: Option<String>,
    pub visible: Option<bool>,
}

impl SceneNode {
    pub fn is_item(&self) -> bool {
        self.scene_node_type == "item"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub resource_id: String,
    pub name: String,
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    /// First source item with the given display name.
    pub fn item_named(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.is_item() && node.name == name)
    }
}

/// The `ScenesService` resource.
#[derive(Clone)]
pub struct ScenesService {
    client: Arc<RpcClient>,
}

impl ScenesService {
    pub const RESOURCE: &'static str = "ScenesService";

    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    pub async fn get_scenes(&self) -> Result<Vec<Scene>, RpcError> {
        self.client
            .call("getScenes", Some(Self::RESOURCE), Vec::new())
            .await
    }

    pub async fn active_scene(&self) -> Result<Scene, RpcError> {
        self.client
            .call("activeScene", Some(Self::RESOURCE), Vec::new())
            .await
    }

    pub async fn active_scene_id(&self) -> Result<String, RpcError> {
        self.client
            .call("activeSceneId", Some(Self::RESOURCE), Vec::new())
            .await
    }

    /// Switch to the scene with `scene_id`; `false` if it does not exist.
    pub async fn make_scene_active(&self, scene_id: &str) -> Result<bool, RpcError> {
        self.client
            .call("makeSceneActive", Some(Self::RESOURCE), vec![json!(scene_id)])
            .await
    }

    /// Show or hide a scene item, addressed by its own resource id.
    pub async fn set_item_visibility(&self, item_resource_id: &str, visible: bool) -> Result<(), RpcError> {
        self.client
            .fire_and_forget("setVisibility", Some(item_resource_id), vec![json!(visible)])
            .await
    }
}
