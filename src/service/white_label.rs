//! Branding configuration behind /api/white-label: one JSON file holding
//! the report branding, plus the static report-template catalog.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhiteLabelConfig {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub custom_css: String,
    #[serde(default)]
    pub footer_text: String,
    #[serde(default = "empty_object")]
    pub contact_info: Value,
    #[serde(default = "empty_object")]
    pub social_links: Value,
    #[serde(default = "default_report_template")]
    pub report_template: String,
    #[serde(default = "default_show_powered_by")]
    pub show_powered_by: bool,
    #[serde(default)]
    pub custom_domain: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_primary_color() -> String {
    "#3b82f6".to_string()
}

fn default_secondary_color() -> String {
    "#1e40af".to_string()
}

fn default_accent_color() -> String {
    "#f59e0b".to_string()
}

fn default_font_family() -> String {
    "Inter".to_string()
}

fn default_report_template() -> String {
    "professional".to_string()
}

fn default_show_powered_by() -> bool {
    true
}

fn empty_object() -> Value {
    json!({})
}

impl Default for WhiteLabelConfig {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            logo_url: String::new(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
            accent_color: default_accent_color(),
            font_family: default_font_family(),
            custom_css: String::new(),
            footer_text: String::new(),
            contact_info: empty_object(),
            social_links: empty_object(),
            report_template: default_report_template(),
            show_powered_by: default_show_powered_by(),
            custom_domain: String::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl WhiteLabelConfig {
    /// Folds recognized keys from a request body into the config. Unknown
    /// keys and mistyped values are ignored.
    pub fn apply(&mut self, changes: &Value) {
        let text = |key: &str| changes.get(key).and_then(Value::as_str).map(str::to_string);

        if let Some(value) = text("company_name") {
            self.company_name = value;
        }
        if let Some(value) = text("logo_url") {
            self.logo_url = value;
        }
        if let Some(value) = text("primary_color") {
            self.primary_color = value;
        }
        if let Some(value) = text("secondary_color") {
            self.secondary_color = value;
        }
        if let Some(value) = text("accent_color") {
            self.accent_color = value;
        }
        if let Some(value) = text("font_family") {
            self.font_family = value;
        }
        if let Some(value) = text("custom_css") {
            self.custom_css = value;
        }
        if let Some(value) = text("footer_text") {
            self.footer_text = value;
        }
        if let Some(value) = changes.get("contact_info").filter(|v| v.is_object()) {
            self.contact_info = value.clone();
        }
        if let Some(value) = changes.get("social_links").filter(|v| v.is_object()) {
            self.social_links = value.clone();
        }
        if let Some(value) = text("report_template") {
            self.report_template = value;
        }
        if let Some(value) = changes.get("show_powered_by").and_then(Value::as_bool) {
            self.show_powered_by = value;
        }
        if let Some(value) = text("custom_domain") {
            self.custom_domain = value;
        }
    }

    /// Field-keyed validation errors; empty means the config is acceptable.
    pub fn validate(&self) -> Map<String, Value> {
        let mut errors = Map::new();

        if self.company_name.trim().is_empty() {
            errors.insert(
                "company_name".to_string(),
                json!("Company name is required"),
            );
        }

        let colors = [
            ("primary_color", &self.primary_color),
            ("secondary_color", &self.secondary_color),
            ("accent_color", &self.accent_color),
        ];
        for (field, color) in colors {
            if !color.starts_with('#') || color.chars().count() != 7 {
                errors.insert(
                    field.to_string(),
                    json!(format!("{} must be a valid hex color", field_label(field))),
                );
            }
        }

        errors
    }

    pub fn css_variables(&self) -> String {
        format!(
            ":root {{\n    --primary-color: {};\n    --secondary-color: {};\n    --accent-color: {};\n    --font-family: '{}', sans-serif;\n}}\n\n{}",
            self.primary_color,
            self.secondary_color,
            self.accent_color,
            self.font_family,
            self.custom_css
        )
    }
}

fn field_label(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replaces the branding placeholders a report template carries.
pub fn apply_branding(html: &str, config: &WhiteLabelConfig) -> String {
    let powered_by = if config.show_powered_by {
        "Powered by SEO Analyzer Pro"
    } else {
        ""
    };

    html.replace("{{COMPANY_NAME}}", &config.company_name)
        .replace("{{LOGO_URL}}", &config.logo_url)
        .replace("{{PRIMARY_COLOR}}", &config.primary_color)
        .replace("{{SECONDARY_COLOR}}", &config.secondary_color)
        .replace("{{ACCENT_COLOR}}", &config.accent_color)
        .replace("{{FONT_FAMILY}}", &config.font_family)
        .replace("{{FOOTER_TEXT}}", &config.footer_text)
        .replace("{{CUSTOM_CSS}}", &config.css_variables())
        .replace("{{POWERED_BY}}", powered_by)
}

/// Static report template catalog.
pub fn templates() -> Value {
    let full_sections = json!([
        "executive_summary",
        "technical_seo",
        "performance",
        "content_analysis",
        "backlinks",
        "social_media",
        "security",
        "recommendations"
    ]);

    json!({
        "professional": {
            "name": "Professional",
            "description": "Clean, corporate design perfect for client presentations",
            "layout": "standard",
            "color_scheme": "blue",
            "sections": full_sections,
        },
        "modern": {
            "name": "Modern",
            "description": "Contemporary design with bold colors and graphics",
            "layout": "grid",
            "color_scheme": "gradient",
            "sections": full_sections,
        },
        "minimal": {
            "name": "Minimal",
            "description": "Simple, clean layout focusing on data and insights",
            "layout": "simple",
            "color_scheme": "monochrome",
            "sections": [
                "executive_summary",
                "technical_seo",
                "performance",
                "recommendations"
            ],
        },
    })
}

pub enum ConfigUpdate {
    Applied(WhiteLabelConfig),
    Invalid(Map<String, Value>),
}

pub struct WhiteLabelStore {
    path: PathBuf,
    config: Mutex<WhiteLabelConfig>,
}

impl WhiteLabelStore {
    /// Opens the store; a missing or unreadable file yields the defaults.
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create white-label directory")?;
        }

        let config = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_default(),
            Err(_) => WhiteLabelConfig::default(),
        };

        Ok(Self {
            path,
            config: Mutex::new(config),
        })
    }

    pub async fn get(&self) -> WhiteLabelConfig {
        self.config.lock().await.clone()
    }

    /// Applies and persists the changes, or reports validation errors
    /// without touching the stored config.
    pub async fn update(&self, changes: &Value) -> anyhow::Result<ConfigUpdate> {
        let mut config = self.config.lock().await;

        let mut candidate = config.clone();
        candidate.apply(changes);

        let errors = candidate.validate();
        if !errors.is_empty() {
            return Ok(ConfigUpdate::Invalid(errors));
        }

        let now = Utc::now().to_rfc3339();
        if candidate.created_at.is_none() {
            candidate.created_at = Some(now.clone());
        }
        candidate.updated_at = Some(now);

        let payload = serde_json::to_string_pretty(&candidate)
            .context("Failed to serialize white-label config")?;
        tokio::fs::write(&self.path, payload)
            .await
            .context("Failed to write white-label config")?;

        *config = candidate.clone();
        tracing::info!(company = %candidate.company_name, "updated white-label config");
        Ok(ConfigUpdate::Applied(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fail_validation_on_company_name_only() {
        let errors = WhiteLabelConfig::default().validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["company_name"], json!("Company name is required"));
    }

    #[test]
    fn bad_colors_report_their_field_label() {
        let mut config = WhiteLabelConfig {
            company_name: "Acme".to_string(),
            ..WhiteLabelConfig::default()
        };
        config.primary_color = "blue".to_string();
        config.accent_color = "#f59e0".to_string();

        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors["primary_color"],
            json!("Primary Color must be a valid hex color")
        );
        assert_eq!(
            errors["accent_color"],
            json!("Accent Color must be a valid hex color")
        );
    }

    #[test]
    fn css_variables_embed_theme_and_custom_css() {
        let config = WhiteLabelConfig {
            custom_css: ".report { margin: 0; }".to_string(),
            ..WhiteLabelConfig::default()
        };

        let css = config.css_variables();
        assert!(css.contains("--primary-color: #3b82f6;"));
        assert!(css.contains("--font-family: 'Inter', sans-serif;"));
        assert!(css.ends_with(".report { margin: 0; }"));
    }

    #[test]
    fn branding_replaces_placeholders() {
        let mut config = WhiteLabelConfig {
            company_name: "Acme SEO".to_string(),
            ..WhiteLabelConfig::default()
        };

        let template = "<h1>{{COMPANY_NAME}}</h1><footer>{{POWERED_BY}}</footer>";
        assert_eq!(
            apply_branding(template, &config),
            "<h1>Acme SEO</h1><footer>Powered by SEO Analyzer Pro</footer>"
        );

        config.show_powered_by = false;
        assert_eq!(
            apply_branding(template, &config),
            "<h1>Acme SEO</h1><footer></footer>"
        );
    }

    #[test]
    fn template_catalog_lists_three_layouts() {
        let catalog = templates();
        assert_eq!(catalog["professional"]["layout"], json!("standard"));
        assert_eq!(catalog["modern"]["color_scheme"], json!("gradient"));
        assert_eq!(
            catalog["minimal"]["sections"].as_array().unwrap().len(),
            4
        );
        assert_eq!(
            catalog["professional"]["sections"].as_array().unwrap().len(),
            8
        );
    }

    #[tokio::test]
    async fn updates_persist_and_invalid_changes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white_label.json");

        let store = WhiteLabelStore::open(&path).await.unwrap();
        let outcome = store
            .update(&json!({"company_name": "Acme", "primary_color": "#111111"}))
            .await
            .unwrap();
        let ConfigUpdate::Applied(applied) = outcome else {
            panic!("expected the update to apply");
        };
        assert_eq!(applied.company_name, "Acme");
        assert!(applied.updated_at.is_some());

        let rejected = store
            .update(&json!({"primary_color": "red"}))
            .await
            .unwrap();
        let ConfigUpdate::Invalid(errors) = rejected else {
            panic!("expected validation errors");
        };
        assert!(errors.contains_key("primary_color"));
        assert_eq!(store.get().await.primary_color, "#111111");

        let reopened = WhiteLabelStore::open(&path).await.unwrap();
        assert_eq!(reopened.get().await.company_name, "Acme");
    }
}
