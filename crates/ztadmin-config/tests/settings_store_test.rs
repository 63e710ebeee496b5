#![allow(clippy::unwrap_used)]
// Integration tests for the on-disk settings store.

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use serde_json::json;

use ztadmin_config::{
    BackendProfile, ConfigError, ResolveOptions, SettingsStore, SettingsUpdate, StaleActivePolicy,
    TOKEN_MASK, TokenResolver, resolve_effective_config,
};

fn options() -> ResolveOptions {
    ResolveOptions {
        default_address: "http://localhost:9993".into(),
        stale_active: StaleActivePolicy::FirstProfile,
        tokens: TokenResolver::profile_only(),
    }
}

#[tokio::test]
async fn test_missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::in_dir(dir.path());

    let settings = store.load().await.unwrap();

    assert!(settings.backends.is_empty());
    assert!(settings.active_id.is_none());
}

#[tokio::test]
async fn test_legacy_file_resolves_and_is_rewritten_in_current_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::in_dir(dir.path());
    std::fs::write(
        store.path(),
        json!({"address": "http://h:1", "token": "t"}).to_string(),
    )
    .unwrap();

    let settings = store.load().await.unwrap();
    let effective = resolve_effective_config(&settings, &options())
        .await
        .unwrap();
    assert_eq!(effective.address, "http://h:1");
    assert_eq!(effective.token.expose_secret(), "t");

    // Echo the masked view back unchanged.
    let masked = settings.masked();
    assert_eq!(masked.backends[0].token, TOKEN_MASK);
    store
        .update(SettingsUpdate {
            active_id: masked.active_id.clone(),
            backends: masked.backends,
        })
        .await
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(
        raw,
        json!({
            "activeId": "default",
            "backends": [{"id": "default", "name": "Default", "address": "http://h:1", "token": "t"}],
        })
    );
}

#[tokio::test]
async fn test_update_changes_active_profile() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::in_dir(dir.path());

    let saved = store
        .update(SettingsUpdate {
            active_id: Some("lab".into()),
            backends: vec![
                BackendProfile {
                    id: "home".into(),
                    name: "Home".into(),
                    address: "http://home:9993".into(),
                    token: "home-token".into(),
                },
                BackendProfile {
                    id: "lab".into(),
                    name: "Lab".into(),
                    address: "https://lab:9993".into(),
                    token: "lab-token".into(),
                },
            ],
        })
        .await
        .unwrap();
    assert_eq!(saved.active_id.as_deref(), Some("lab"));

    let effective = resolve_effective_config(&store.load().await.unwrap(), &options())
        .await
        .unwrap();
    assert_eq!(effective.address, "https://lab:9993");
    assert_eq!(effective.token.expose_secret(), "lab-token");
}

#[tokio::test]
async fn test_rejected_update_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::in_dir(dir.path());
    std::fs::write(store.path(), r#"{"ztAddr":"http://old:9993","ztToken":"old"}"#).unwrap();

    let err = store
        .update(SettingsUpdate {
            active_id: None,
            backends: vec![BackendProfile {
                id: "x".into(),
                address: "::not a url::".into(),
                ..BackendProfile::default()
            }],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(raw, r#"{"ztAddr":"http://old:9993","ztToken":"old"}"#);
}

#[tokio::test]
async fn test_malformed_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::in_dir(dir.path());
    std::fs::write(store.path(), "{not json").unwrap();

    let err = store.load().await.unwrap_err();
    assert!(matches!(err, ConfigError::Json { .. }));
}
