//! Streaming Application Integration Tests
//!
//! Resource wrappers over the transport, against a scripted fake.

use serde_json::json;

use streambot::services::obs::{AudioService, AudioSource, ScenesService};
use streambot::services::rpc::{ErrorCode, RpcError};

use crate::support::spawn_fake_obs;

#[tokio::test]
async fn test_scenes_service_calls() {
    let (client, log) = spawn_fake_obs(|request| match request["method"].as_str() {
        Some("activeSceneId") => Ok(json!("scene_2")),
        Some("getScenes") => Ok(json!([
            {"id": "scene_1", "resourceId": "Scene[\"scene_1\"]", "name": "Starting", "nodes": []},
            {"id": "scene_2", "resourceId": "Scene[\"scene_2\"]", "name": "Gameplay", "nodes": []}
        ])),
        Some("makeSceneActive") => Ok(json!(request["params"]["args"][0] == "scene_1")),
        Some("setVisibility") => Ok(json!(null)),
        _ => Err((-32601, "Method not found")),
    });
    let scenes = ScenesService::new(client);

    assert_eq!(scenes.active_scene_id().await.unwrap(), "scene_2");

    let all = scenes.get_scenes().await.unwrap();
    let names: Vec<&str> = all.iter().map(|scene| scene.name.as_str()).collect();
    assert_eq!(names, vec!["Starting", "Gameplay"]);

    assert!(scenes.make_scene_active("scene_1").await.unwrap());
    assert!(!scenes.make_scene_active("missing").await.unwrap());

    scenes
        .set_item_visibility("SceneItem[\"scene_1\",\"n1\",\"cam\"]", false)
        .await
        .unwrap();

    let requests = log.all();
    assert!(requests[..4]
        .iter()
        .all(|req| req["params"]["resource"] == ScenesService::RESOURCE));
    assert!(requests[0]["params"].get("args").is_none(), "no args key without arguments");
    assert_eq!(requests[4]["method"], "setVisibility");
    assert_eq!(requests[4]["params"]["resource"], "SceneItem[\"scene_1\",\"n1\",\"cam\"]");
    assert_eq!(requests[4]["params"]["args"], json!([false]));
}

#[tokio::test]
async fn test_audio_service_calls() {
    let (client, log) = spawn_fake_obs(|request| match request["method"].as_str() {
        Some("getSourcesForScene") => Ok(json!([
            {"sourceId": "mic", "resourceId": "AudioSource[\"mic\"]", "fader": {"db": 0.0, "deflection": 1.0, "mul": 1.0}}
        ])),
        Some("getSource") => Ok(json!(null)),
        Some("setDeflection") | Some("setMul") => Ok(json!(null)),
        _ => Err((-32601, "Method not found")),
    });
    let audio = AudioService::new(client);

    let sources: Vec<AudioSource> = audio.get_sources_for_scene("scene_1").await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].fader.deflection, 1.0);

    assert_eq!(audio.get_source("nope").await.unwrap(), None);

    audio.set_deflection(&sources[0], 0.5).await.unwrap();
    audio.set_mul(&sources[0], 0.25).await.unwrap();

    let requests = log.all();
    assert_eq!(requests[0]["params"]["args"], json!(["scene_1"]));
    assert_eq!(requests[2]["params"]["resource"], "AudioSource[\"mic\"]");
    assert_eq!(requests[2]["params"]["args"], json!([0.5]));
    assert_eq!(requests[3]["method"], "setMul");
}

#[tokio::test]
async fn test_remote_error_reaches_wrapper_caller() {
    let (client, _log) = spawn_fake_obs(|request| match request["method"].as_str() {
        Some("makeSceneActive") => Err((-32602, "scene id must be a string")),
        _ => Ok(json!("scene_1")),
    });
    let scenes = ScenesService::new(client);

    match scenes.make_scene_active("").await {
        Err(RpcError::Remote { code, message, .. }) => {
            assert_eq!(code, ErrorCode::InvalidParams);
            assert_eq!(message, "scene id must be a string");
        }
        other => panic!("expected remote error, got {:?}", other),
    }

    // The failed call does not disturb the next one.
    assert_eq!(scenes.active_scene_id().await.unwrap(), "scene_1");
}

#[tokio::test]
async fn test_no_reply_call_surfaces_remote_error() {
    let (client, log) = spawn_fake_obs(|request| match request["method"].as_str() {
        Some("setMuted") => Err((-32602, "muted must be a boolean")),
        _ => Ok(json!(null)),
    });
    let audio = AudioService::new(client);
    let source = AudioSource {
        source_id: "mic".to_string(),
        resource_id: "AudioSource[\"mic\"]".to_string(),
        ..Default::default()
    };

    match audio.set_muted(&source, true).await {
        Err(RpcError::Remote { code, message, .. }) => {
            assert_eq!(code, ErrorCode::InvalidParams);
            assert_eq!(message, "muted must be a boolean");
        }
        other => panic!("expected remote error, got {:?}", other),
    }

    // Success still reports plain `Ok(())`.
    audio.set_mul(&source, 0.5).await.unwrap();
    assert_eq!(log.methods(), vec!["setMuted", "setMul"]);
}

#[tokio::test]
async fn test_wrong_shape_is_decode_error() {
    let (client, _log) = spawn_fake_obs(|_| Ok(json!({"not": "a list"})));
    let audio = AudioService::new(client);

    let err = audio.get_sources().await.unwrap_err();
    assert!(matches!(err, RpcError::Decode { .. }), "got {:?}", err);
}
