//! Application settings schema.
//!
//! [`AppSettings`] is the current schema version. Records written by older
//! clients are brought up to date by [`migrations::decode_settings`] before
//! anything else sees them. Fields this version does not know about are kept
//! in [`AppSettings::extra`] and written back out unchanged.

pub mod errors;
pub mod migrations;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use errors::SettingsError;
pub use migrations::{CURRENT_VERSION, decode_settings, encode_settings, parse_settings};

/// Colour scheme preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Follow the operating system
    #[default]
    System,
    Light,
    Dark,
}

/// Maximum width of the main content column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageWidth {
    /// Fill the window
    #[default]
    None,
    Sm,
    Md,
    Lg,
    Xl,
}

/// How lightning invoices are paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightningPayMode {
    /// Ask every time
    #[default]
    Prompt,
    /// Pay through a WebLN provider
    Webln,
    /// Open an external wallet
    External,
}

/// The user's application settings, at [`CURRENT_VERSION`].
///
/// Serialized with camelCase field names. Missing fields take the value from
/// [`AppSettings::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version of this record
    pub version: u32,

    pub color_mode: ColorMode,
    /// CSS colour used for accents
    pub primary_color: String,
    pub max_page_width: PageWidth,

    pub blur_images: bool,
    pub auto_show_media: bool,
    /// Load user media through `image_proxy`
    pub proxy_user_media: bool,
    pub show_reactions: bool,
    pub show_signature_verification: bool,
    pub show_content_warning: bool,
    pub hide_usernames: bool,
    pub remove_emojis_in_usernames: bool,
    pub load_open_graph_data: bool,

    /// Comma separated list of words whose notes are hidden
    pub muted_words: String,
    pub quick_reactions: Vec<String>,
    /// Preset zap amounts in sats
    pub zap_amounts: Vec<u64>,
    pub lightning_pay_mode: LightningPayMode,

    pub image_proxy: String,
    pub cors_proxy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reddit_redirect: Option<String>,

    /// Fields not known to this schema version
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            color_mode: ColorMode::System,
            primary_color: "#8DB600".to_string(),
            max_page_width: PageWidth::None,
            blur_images: true,
            auto_show_media: true,
            proxy_user_media: false,
            show_reactions: true,
            show_signature_verification: false,
            show_content_warning: true,
            hide_usernames: false,
            remove_emojis_in_usernames: false,
            load_open_graph_data: true,
            muted_words: String::new(),
            quick_reactions: default_quick_reactions(),
            zap_amounts: default_zap_amounts(),
            lightning_pay_mode: LightningPayMode::Prompt,
            image_proxy: String::new(),
            cors_proxy: String::new(),
            youtube_redirect: None,
            twitter_redirect: None,
            reddit_redirect: None,
            extra: Map::new(),
        }
    }
}

impl AppSettings {
    /// Muted words as a list, trimmed and without empty entries.
    pub fn muted_word_list(&self) -> Vec<&str> {
        self.muted_words
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .collect()
    }
}

pub(crate) fn default_quick_reactions() -> Vec<String> {
    ["+", "🤙", "❤️", "😂", "🔥"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub(crate) fn default_zap_amounts() -> Vec<u64> {
    vec![50, 200, 500, 1000, 2000, 5000]
}
