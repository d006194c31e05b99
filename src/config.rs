//! Run configuration, as read by `parammap_dump`.
//!
//! ```json
//! {
//!   "settings": { "includePadding": false, "includeSysex": true, "truncateName": false,
//!                 "prettyJSON": true, "textTableToConsole": false },
//!   "importXML": [ { "file": "tone.xml", "blocks": ["TONE"], "groups": ["PATCH"] } ]
//! }
//! ```

use crate::settings::ResolveSettings;
use serde::Deserialize;
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSettings {
    #[serde(default)]
    pub include_padding: bool,
    #[serde(default = "default_true")]
    pub include_sysex: bool,
    #[serde(default)]
    pub truncate_name: bool,
    #[serde(default, rename = "prettyJSON")]
    pub pretty_json: bool,
    #[serde(default)]
    pub text_table_to_console: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            include_padding: false,
            include_sysex: true,
            truncate_name: false,
            pretty_json: false,
            text_table_to_console: false,
        }
    }
}

impl RunSettings {
    pub fn resolve_settings(&self) -> ResolveSettings {
        ResolveSettings::new()
            .include_padding(self.include_padding)
            .include_sysex(self.include_sysex)
            .truncate_name(self.truncate_name)
    }
}

/// One schema document and the names to resolve from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportXml {
    pub file: PathBuf,
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub settings: RunSettings,
    #[serde(rename = "importXML")]
    pub import_xml: Vec<ImportXml>,
}

impl RunConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_json(r#"{ "importXML": [ { "file": "a.xml" } ] }"#).unwrap();

        assert_eq!(config.settings, RunSettings::default());
        assert_eq!(config.settings.resolve_settings(), ResolveSettings::new());
        assert_eq!(
            config.import_xml,
            vec![ImportXml {
                file: PathBuf::from("a.xml"),
                blocks: vec![],
                groups: vec![],
            }]
        );
    }

    #[test]
    fn test_full_config() {
        let config = RunConfig::from_json(
            r#"{
                "settings": { "includePadding": true, "includeSysex": false, "truncateName": true,
                              "prettyJSON": true, "textTableToConsole": true },
                "importXML": [ { "file": "tone.xml", "blocks": ["TONE"], "groups": ["PATCH"] } ]
            }"#,
        )
        .unwrap();

        assert!(config.settings.pretty_json);
        assert!(config.settings.text_table_to_console);
        assert_eq!(
            config.settings.resolve_settings(),
            ResolveSettings::new()
                .include_padding(true)
                .include_sysex(false)
                .truncate_name(true)
        );
        assert_eq!(config.import_xml[0].blocks, vec!["TONE"]);
    }

    #[test]
    fn test_missing_imports() {
        assert!(RunConfig::from_json(r#"{ "settings": {} }"#).is_err());
    }
}
