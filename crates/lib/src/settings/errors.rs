//! Error types for settings decoding.

use thiserror::Error;

/// Errors that can occur while decoding a settings record or event.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The record is not a JSON object, or its version is malformed.
    #[error("Invalid settings record: found {found}")]
    InvalidRecord {
        /// What was found instead
        found: &'static str,
    },

    /// The record was written by a newer schema than this build understands.
    #[error("Unsupported settings version {version}; newest known is {current}")]
    UnsupportedVersion {
        /// Version stored in the record
        version: u64,
        /// Newest version this build can read
        current: u32,
    },

    /// The content is not valid JSON, or a migrated record failed to map
    /// onto the schema.
    #[error("Failed to decode settings: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    /// The event is not a settings event for this client.
    #[error("Event {event_id} is not a settings event: {reason}")]
    NotSettingsEvent {
        /// ID of the rejected event
        event_id: String,
        /// Why it was rejected
        reason: String,
    },
}

impl SettingsError {
    /// Check if the record itself was malformed (as opposed to the event
    /// around it).
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            SettingsError::InvalidRecord { .. }
                | SettingsError::Decode { .. }
                | SettingsError::UnsupportedVersion { .. }
        )
    }

    /// Check if the record came from a newer client.
    pub fn is_version_error(&self) -> bool {
        matches!(self, SettingsError::UnsupportedVersion { .. })
    }
}

impl From<SettingsError> for crate::Error {
    fn from(err: SettingsError) -> Self {
        crate::Error::Settings(err)
    }
}
