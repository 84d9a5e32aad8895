//! The company settings singleton.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Fixed identifier of the settings row.
///
/// The remote store holds exactly one settings row; read-or-create always
/// addresses it under this well-known id so every client converges on the
/// same row.
static SETTINGS_ROW_ID: Lazy<Uuid> = Lazy::new(|| {
    Uuid::parse_str("a8e9e3e3-1b1b-4b1b-8b1b-1b1b1b1b1b1b")
        .expect("well-known settings id is a valid UUID")
});

/// The well-known identifier of the singleton settings row.
pub fn settings_row_id() -> Uuid {
    *SETTINGS_ROW_ID
}

/// Company-wide display settings. Exactly one row exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    pub id: Uuid,
    /// Opaque theme document consumed by the presentation layer.
    pub theme: serde_json::Value,
    /// ISO 4217 currency code used for display formatting.
    pub currency: String,
    pub favicon_url: String,
    pub show_driver_items_sold: bool,
    pub show_driver_commission: bool,
    pub show_driver_schedule: bool,
}

static DEFAULT_SETTINGS: Lazy<CompanySettings> = Lazy::new(|| CompanySettings {
    id: settings_row_id(),
    theme: json!({
        "primary": "#0f766e",
        "secondary": "#f1f5f9",
        "background": "#ffffff",
        "foreground": "#0f172a",
    }),
    currency: "IDR".to_string(),
    favicon_url: String::new(),
    show_driver_items_sold: true,
    show_driver_commission: true,
    show_driver_schedule: true,
});

/// The default settings template used when no row exists yet.
pub fn default_settings() -> CompanySettings {
    DEFAULT_SETTINGS.clone()
}

/// Partial update of the settings singleton. Unset fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_driver_items_sold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_driver_commission: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_driver_schedule: Option<bool>,
}

impl SettingsPatch {
    /// Whether the patch changes anything at all.
    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }
}
