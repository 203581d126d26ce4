//! Settings schema migrations.
//!
//! Each migration upgrades a raw JSON record by exactly one version. Records
//! without a `version` field are version 0. Migrations only touch the fields
//! they are about; everything else, including fields unknown to every
//! version, passes through.

use serde_json::{Map, Value};

use super::{AppSettings, SettingsError, default_quick_reactions, default_zap_amounts};
use crate::Result;

/// Schema version of [`AppSettings`].
pub const CURRENT_VERSION: u32 = 4;

type Migration = fn(&mut Map<String, Value>);

/// `(from_version, migration)` in upgrade order.
const MIGRATIONS: &[(u64, Migration)] = &[
    (0, v0_to_v1),
    (1, v1_to_v2),
    (2, v2_to_v3),
    (3, v3_to_v4),
];

/// Decode a raw settings record of any known version into [`AppSettings`].
///
/// # Errors
/// - [`SettingsError::InvalidRecord`] if `raw` is not an object, or its
///   `version` is not a non-negative integer
/// - [`SettingsError::UnsupportedVersion`] if the record is newer than
///   [`CURRENT_VERSION`]
/// - [`SettingsError::Decode`] if a known field has the wrong type
pub fn decode_settings(raw: Value) -> std::result::Result<AppSettings, SettingsError> {
    let mut record = match raw {
        Value::Object(map) => map,
        other => {
            return Err(SettingsError::InvalidRecord {
                found: json_type(&other),
            });
        }
    };

    let mut version = match record.get("version") {
        None => 0,
        Some(value) => value.as_u64().ok_or(SettingsError::InvalidRecord {
            found: "non-integer version",
        })?,
    };
    if version > u64::from(CURRENT_VERSION) {
        return Err(SettingsError::UnsupportedVersion {
            version,
            current: CURRENT_VERSION,
        });
    }

    for (from, migrate) in MIGRATIONS {
        if version == *from {
            migrate(&mut record);
            version += 1;
            tracing::trace!(version, "Migrated settings record");
        }
    }
    record.insert("version".to_string(), Value::from(CURRENT_VERSION));

    serde_json::from_value(Value::Object(record)).map_err(|source| SettingsError::Decode { source })
}

/// Parse JSON text and decode it with [`decode_settings`].
pub fn parse_settings(content: &str) -> std::result::Result<AppSettings, SettingsError> {
    let raw: Value =
        serde_json::from_str(content).map_err(|source| SettingsError::Decode { source })?;
    decode_settings(raw)
}

/// Encode settings as the JSON text stored in events and on disk.
pub fn encode_settings(settings: &AppSettings) -> Result<String> {
    Ok(serde_json::to_string(settings)?)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Unversioned records predate zaps.
fn v0_to_v1(record: &mut Map<String, Value>) {
    record
        .entry("zapAmounts")
        .or_insert_with(|| Value::from(default_zap_amounts()));
    record
        .entry("lightningPayMode")
        .or_insert_with(|| Value::from("prompt"));
}

/// Separate image and video toggles became a single media toggle.
fn v1_to_v2(record: &mut Map<String, Value>) {
    let images = record
        .remove("autoShowImages")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    let videos = record
        .remove("autoShowVideos")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    record
        .entry("autoShowMedia")
        .or_insert(Value::Bool(images || videos));
}

/// Muted words moved from a list to a comma separated string.
fn v2_to_v3(record: &mut Map<String, Value>) {
    if let Some(Value::Array(words)) = record.get("mutedWords") {
        let joined = words
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        record.insert("mutedWords".to_string(), Value::String(joined));
    }
}

/// Quick reactions were added and the theme switch was removed.
fn v3_to_v4(record: &mut Map<String, Value>) {
    record
        .entry("quickReactions")
        .or_insert_with(|| Value::from(default_quick_reactions()));
    record.remove("theme");
}
