mod common;

use common::{LegacyState, MemoryKvStore};
use serde_json::json;

use tally::device_id::TEMPORARY_DEVICE_ID;
use tally::migration::{MigrationController, MigrationError, DATA_SCHEMA_VERSION};
use tally::primitives::config::MigrationParams;
use tally::remote_config::RemoteConfigValueStore;
use tally::storage::{namespaced_key, SCHEMA_VERSION_KEY};

const NO_CUSTOM_ID: MigrationParams = MigrationParams {
    custom_id_set: false,
};

#[test]
fn test_resolution_is_idempotent() -> anyhow::Result<()> {
    for version in [0, 2, DATA_SCHEMA_VERSION, 77, -5] {
        let kv = MemoryKvStore::new();
        LegacyState {
            schema_version: Some(version),
            ..LegacyState::default()
        }
        .write_to(&kv);
        let controller = MigrationController::new(kv.clone());

        assert_eq!(controller.current_schema_version()?, version);
        assert_eq!(controller.current_schema_version()?, version);
        assert_eq!(kv.raw(SCHEMA_VERSION_KEY), Some(version.to_string()));
    }
    Ok(())
}

#[test]
fn test_every_old_schema_converges_to_latest() -> anyhow::Result<()> {
    for version in 0..DATA_SCHEMA_VERSION {
        let kv = MemoryKvStore::new();
        LegacyState {
            schema_version: Some(version),
            device_id: Some("123"),
            device_id_type: Some("OPEN_UDID"),
            requests: &["app_key=a&timestamp=1"],
            ..LegacyState::default()
        }
        .write_to(&kv);

        let summary = MigrationController::new(kv.clone()).run_all(NO_CUSTOM_ID)?;

        assert_eq!(summary.from_version, version);
        assert_eq!(summary.to_version, DATA_SCHEMA_VERSION);
        assert_eq!(kv.state().schema_version()?, Some(DATA_SCHEMA_VERSION));
    }
    Ok(())
}

#[test]
fn test_legacy_advertising_id_is_normalized() -> anyhow::Result<()> {
    let kv = MemoryKvStore::new();
    LegacyState {
        device_id_type: Some("ADVERTISING_ID"),
        ..LegacyState::default()
    }
    .write_to(&kv);

    MigrationController::new(kv.clone()).run_all(NO_CUSTOM_ID)?;

    let store = kv.state();
    assert_eq!(store.device_id_type()?.as_deref(), Some("OPEN_UDID"));
    let device_id = store.device_id()?.unwrap();
    assert!(device_id.len() > 10 && device_id.len() < 100);

    let kv = MemoryKvStore::new();
    LegacyState {
        device_id: Some("ab"),
        device_id_type: Some("ADVERTISING_ID"),
        ..LegacyState::default()
    }
    .write_to(&kv);

    MigrationController::new(kv.clone()).run_all(MigrationParams {
        custom_id_set: true,
    })?;

    let store = kv.state();
    assert_eq!(store.device_id_type()?.as_deref(), Some("OPEN_UDID"));
    assert_eq!(store.device_id()?.as_deref(), Some("ab"));
    Ok(())
}

#[test]
fn test_remote_config_upgrade() -> anyhow::Result<()> {
    let kv = MemoryKvStore::new();
    LegacyState {
        schema_version: Some(1),
        remote_config: Some(r#"{"a":123,"b":"fg","c":[1,{"d":true}]}"#),
        ..LegacyState::default()
    }
    .write_to(&kv);

    MigrationController::new(kv.clone()).run_all(NO_CUSTOM_ID)?;

    let blob = kv.state().remote_config_blob()?.unwrap();
    let values = RemoteConfigValueStore::parse_current(&blob).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values.get("a").unwrap().value, json!(123));
    assert_eq!(values.get("b").unwrap().value, json!("fg"));
    assert_eq!(values.get("c").unwrap().value, json!([1, {"d": true}]));
    assert!(values.get("c").unwrap().is_current_users_data);
    Ok(())
}

#[test]
fn test_garbage_remote_config_does_not_stop_the_run() -> anyhow::Result<()> {
    let kv = MemoryKvStore::new();
    LegacyState {
        schema_version: Some(1),
        remote_config: Some("{{{ not json"),
        ..LegacyState::default()
    }
    .write_to(&kv);

    let summary = MigrationController::new(kv.clone()).run_all(NO_CUSTOM_ID)?;

    assert_eq!(summary.to_version, DATA_SCHEMA_VERSION);
    let blob = kv.state().remote_config_blob()?.unwrap();
    assert!(RemoteConfigValueStore::parse_current(&blob).unwrap().is_empty());
    Ok(())
}

#[test]
fn test_push_mode_key_is_removed() -> anyhow::Result<()> {
    let kv = MemoryKvStore::new();
    LegacyState {
        schema_version: Some(2),
        ..LegacyState::default()
    }
    .write_to(&kv);
    let legacy_key = namespaced_key("push_messaging", "PUSH_MESSAGING_MODE");
    kv.put(&legacy_key, "1");

    MigrationController::new(kv.clone()).run_all(NO_CUSTOM_ID)?;

    assert_eq!(kv.raw(&legacy_key), None);
    Ok(())
}

#[test]
fn test_queue_backfill() -> anyhow::Result<()> {
    let requests = [
        "app_key=asdsad&timestamp=1&hour=12&dow=3",
        "app_key=asdsad&timestamp=2&begin_session=1",
        "app_key=asdsad&timestamp=3&events=%5B%5D",
    ];

    let kv = MemoryKvStore::new();
    LegacyState {
        schema_version: Some(3),
        device_id: Some("123"),
        device_id_type: Some("DEVELOPER_SUPPLIED"),
        requests: &requests,
        ..LegacyState::default()
    }
    .write_to(&kv);

    MigrationController::new(kv.clone()).run_all(NO_CUSTOM_ID)?;

    let expected: Vec<String> = requests
        .iter()
        .map(|request| format!("{request}&device_id=123"))
        .collect();
    assert_eq!(kv.state().requests()?, expected);

    let kv = MemoryKvStore::new();
    LegacyState {
        schema_version: Some(3),
        device_id: Some(TEMPORARY_DEVICE_ID),
        device_id_type: Some("TEMPORARY_ID"),
        requests: &requests,
        ..LegacyState::default()
    }
    .write_to(&kv);

    MigrationController::new(kv.clone()).run_all(NO_CUSTOM_ID)?;

    for request in kv.state().requests()? {
        assert!(request.ends_with(&format!("&device_id={TEMPORARY_DEVICE_ID}")));
    }
    Ok(())
}

#[test]
fn test_forced_versions_are_respected() -> anyhow::Result<()> {
    let kv = MemoryKvStore::new();
    LegacyState {
        device_id_type: Some("ADVERTISING_ID"),
        ..LegacyState::default()
    }
    .write_to(&kv);
    let controller = MigrationController::new(kv.clone());

    controller.override_schema_version(-333)?;
    let summary = controller.run_all(NO_CUSTOM_ID)?;

    assert_eq!(summary.steps_run, 0);
    assert_eq!(controller.current_schema_version()?, -333);
    assert_eq!(kv.state().device_id_type()?.as_deref(), Some("ADVERTISING_ID"));

    controller.override_schema_version(0)?;
    let summary = controller.run_all(NO_CUSTOM_ID)?;
    assert_eq!(summary.steps_run, DATA_SCHEMA_VERSION);
    assert_eq!(kv.state().device_id_type()?.as_deref(), Some("OPEN_UDID"));
    Ok(())
}

#[test]
fn test_individual_steps_are_safe_on_current_data() -> anyhow::Result<()> {
    let kv = MemoryKvStore::new();
    LegacyState {
        schema_version: Some(0),
        device_id: Some("123"),
        device_id_type: Some("ADVERTISING_ID"),
        remote_config: Some(r#"{"a":1}"#),
        requests: &["a=1"],
    }
    .write_to(&kv);
    let controller = MigrationController::new(kv.clone());
    controller.run_all(NO_CUSTOM_ID)?;
    let store = kv.state();
    let before = (
        store.device_id()?,
        store.device_id_type()?,
        store.remote_config_blob()?,
        store.requests()?,
    );

    for from_version in 0..DATA_SCHEMA_VERSION {
        controller.run_step(from_version, NO_CUSTOM_ID)?;
    }

    let after = (
        store.device_id()?,
        store.device_id_type()?,
        store.remote_config_blob()?,
        store.requests()?,
    );
    assert_eq!(before, after);
    assert!(matches!(
        controller.run_step(DATA_SCHEMA_VERSION, NO_CUSTOM_ID),
        Err(MigrationError::InvalidOperation(_))
    ));
    Ok(())
}
