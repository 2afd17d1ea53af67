//! Tech options and embed player setup
//!
//! Options arrive from the host player as JSON with the host's own key
//! names (`ytControls`, `enablePrivacyEnhancedMode`, ...). They are turned
//! into a [`PlayerSetup`]: the element id, initial video and the
//! `playerVars` map handed to the embed API constructor.

use crate::{locator::ResourceLocator, Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use url::Url;

/// Embed host used when privacy enhanced mode is on
pub const PRIVACY_ENHANCED_HOST: &str = "https://www.youtube-nocookie.com";

/// Element id used when the host does not provide one
pub const DEFAULT_TECH_ID: &str = "tubetech_player";

/// Options recognized at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechOptions {
    /// Id of the element the embed player replaces
    #[serde(default = "default_tech_id")]
    pub tech_id: String,
    /// Explicit poster; disables thumbnail resolution
    pub poster: Option<String>,
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default, rename = "loop")]
    pub loop_enabled: bool,
    #[serde(default)]
    pub muted: bool,
    /// Render YouTube's own controls instead of the blocking overlay
    #[serde(default, deserialize_with = "de_flag")]
    pub yt_controls: Option<u8>,
    #[serde(default, deserialize_with = "de_flag")]
    pub autohide: Option<u8>,
    #[serde(default, rename = "cc_load_policy", deserialize_with = "de_flag")]
    pub cc_load_policy: Option<u8>,
    #[serde(default, deserialize_with = "de_flag")]
    pub disablekb: Option<u8>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    pub fs: Option<u8>,
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub hl: Option<String>,
    pub language: Option<String>,
    #[serde(default, rename = "iv_load_policy", deserialize_with = "de_flag")]
    pub iv_load_policy: Option<u8>,
    pub list: Option<String>,
    pub list_type: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    pub modestbranding: Option<u8>,
    pub playlist: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    pub playsinline: Option<u8>,
    #[serde(default, deserialize_with = "de_flag")]
    pub rel: Option<u8>,
    #[serde(default, deserialize_with = "de_flag")]
    pub showinfo: Option<u8>,
    pub theme: Option<String>,
    /// Raw player vars copied over everything else
    #[serde(default)]
    pub custom_vars: BTreeMap<String, Value>,
    #[serde(default)]
    pub enable_privacy_enhanced_mode: bool,
}

fn default_tech_id() -> String {
    DEFAULT_TECH_ID.to_string()
}

/// Hosts pass player flags either as `0/1` or as booleans.
fn de_flag<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Num(u8),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(b) => b as u8,
        Flag::Num(n) => n,
    }))
}

impl Default for TechOptions {
    fn default() -> Self {
        Self {
            tech_id: default_tech_id(),
            poster: None,
            autoplay: false,
            loop_enabled: false,
            muted: false,
            yt_controls: None,
            autohide: None,
            cc_load_policy: None,
            disablekb: None,
            color: None,
            fs: None,
            start: None,
            end: None,
            hl: None,
            language: None,
            iv_load_policy: None,
            list: None,
            list_type: None,
            modestbranding: None,
            playlist: None,
            playsinline: None,
            rel: None,
            showinfo: None,
            theme: None,
            custom_vars: BTreeMap::new(),
            enable_privacy_enhanced_mode: false,
        }
    }
}

impl TechOptions {
    /// Parse and validate host options
    pub fn from_json(json: &str) -> Result<Self> {
        let options: TechOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tech_id.trim().is_empty() {
            return Err(Error::InvalidOptions("techId must not be empty".into()));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end != 0 && end <= start {
                return Err(Error::InvalidOptions(format!(
                    "end ({}) must be after start ({})",
                    end, start
                )));
            }
        }
        Ok(())
    }

    /// Configured poster. Hosts send an empty string when there is none.
    pub fn explicit_poster(&self) -> Option<&str> {
        self.poster.as_deref().filter(|poster| !poster.is_empty())
    }

    /// Whether native YouTube controls were requested
    pub fn native_controls(&self) -> bool {
        self.yt_controls.unwrap_or(0) != 0
    }
}

/// Runtime platform facts the tech cares about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub is_ios: bool,
    pub is_native_android: bool,
}

impl Platform {
    /// Mobile platforms that refuse programmatic playback and show their own
    /// play button over the iframe
    pub fn is_restricted_mobile(&self) -> bool {
        self.is_ios || self.is_native_android
    }
}

/// Whether the click-blocking overlay should cover the iframe
pub fn uses_iframe_blocker(options: &TechOptions, platform: Platform) -> bool {
    !platform.is_restricted_mobile() && !options.native_controls()
}

/// Everything the embed API constructor needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSetup {
    /// Element replaced by the iframe
    pub element_id: String,
    pub video_id: Option<String>,
    pub player_vars: Map<String, Value>,
    /// Embed host override
    pub host: Option<String>,
}

impl PlayerSetup {
    /// Build the constructor configuration for the current source
    pub fn build(options: &TechOptions, locator: &ResourceLocator) -> Self {
        let mut vars = Map::new();
        vars.insert("controls".into(), json!(0));
        vars.insert("modestbranding".into(), json!(1));
        vars.insert("rel".into(), json!(0));
        vars.insert("showinfo".into(), json!(0));
        vars.insert("loop".into(), u8::from(options.loop_enabled).into());

        set_opt(&mut vars, "autohide", options.autohide);
        set_opt(&mut vars, "cc_load_policy", options.cc_load_policy);
        set_opt(&mut vars, "controls", options.yt_controls);
        set_opt(&mut vars, "disablekb", options.disablekb);
        set_opt(&mut vars, "color", options.color.clone());

        if options.native_controls() {
            set_opt(&mut vars, "fs", options.fs);
        } else {
            vars.insert("fs".into(), json!(0));
        }

        set_opt(&mut vars, "end", effective_end(options, locator));

        let hl = options.hl.clone().or_else(|| {
            options
                .language
                .as_ref()
                .map(|lang| lang.chars().take(2).collect::<String>())
        });
        set_opt(&mut vars, "hl", hl);

        set_opt(&mut vars, "iv_load_policy", options.iv_load_policy);
        set_opt(
            &mut vars,
            "list",
            options.list.clone().or_else(|| locator.list_id.clone()),
        );
        set_opt(&mut vars, "listType", options.list_type.clone());
        set_opt(&mut vars, "modestbranding", options.modestbranding);
        set_opt(&mut vars, "playlist", options.playlist.clone());
        set_opt(&mut vars, "playsinline", options.playsinline);
        set_opt(&mut vars, "rel", options.rel);
        set_opt(&mut vars, "showinfo", options.showinfo);
        set_opt(&mut vars, "start", effective_start(options, locator));
        set_opt(&mut vars, "theme", options.theme.clone());

        for (key, value) in &options.custom_vars {
            vars.insert(key.clone(), value.clone());
        }

        Self {
            element_id: options.tech_id.clone(),
            video_id: locator.video_id.clone(),
            player_vars: vars,
            host: options
                .enable_privacy_enhanced_mode
                .then(|| PRIVACY_ENHANCED_HOST.to_string()),
        }
    }

    /// Playlist the player starts with, if any
    pub fn list(&self) -> Option<String> {
        self.player_vars
            .get("list")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Parsed embed host
    pub fn host_url(&self) -> Result<Option<Url>> {
        self.host
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(Error::from)
    }
}

fn set_opt<T: Into<Value>>(vars: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        vars.insert(key.to_string(), value.into());
    }
}

/// Start offset: a `start=` in the source wins over the option
pub fn effective_start(options: &TechOptions, locator: &ResourceLocator) -> Option<u32> {
    locator.start.or(options.start)
}

/// End offset: an `end=` in the source wins over the option
pub fn effective_end(options: &TechOptions, locator: &ResourceLocator) -> Option<u32> {
    locator.end.or(options.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = TechOptions::default();
        let setup = PlayerSetup::build(&options, &ResourceLocator::default());

        assert_eq!(setup.element_id, DEFAULT_TECH_ID);
        assert_eq!(setup.player_vars["controls"], json!(0));
        assert_eq!(setup.player_vars["modestbranding"], json!(1));
        assert_eq!(setup.player_vars["rel"], json!(0));
        assert_eq!(setup.player_vars["showinfo"], json!(0));
        assert_eq!(setup.player_vars["loop"], json!(0));
        assert_eq!(setup.player_vars["fs"], json!(0));
        assert!(setup.host.is_none());
        assert!(setup.video_id.is_none());
    }

    #[test]
    fn test_from_json_host_keys() {
        let options = TechOptions::from_json(
            r#"{
                "techId": "vjs_tech_1",
                "ytControls": true,
                "fs": 1,
                "cc_load_policy": 1,
                "iv_load_policy": 3,
                "language": "fr-CA",
                "loop": true,
                "listType": "playlist",
                "enablePrivacyEnhancedMode": true,
                "customVars": { "wmode": "transparent", "fs": 0 }
            }"#,
        )
        .unwrap();

        assert_eq!(options.tech_id, "vjs_tech_1");
        assert!(options.native_controls());
        assert!(options.loop_enabled);

        let setup = PlayerSetup::build(&options, &ResourceLocator::default());
        assert_eq!(setup.player_vars["controls"], json!(1));
        assert_eq!(setup.player_vars["hl"], json!("fr"));
        assert_eq!(setup.player_vars["cc_load_policy"], json!(1));
        assert_eq!(setup.player_vars["iv_load_policy"], json!(3));
        assert_eq!(setup.player_vars["listType"], json!("playlist"));
        assert_eq!(setup.player_vars["loop"], json!(1));
        // custom vars are applied last
        assert_eq!(setup.player_vars["fs"], json!(0));
        assert_eq!(setup.player_vars["wmode"], json!("transparent"));
        assert_eq!(
            setup.host_url().unwrap().unwrap().as_str(),
            "https://www.youtube-nocookie.com/"
        );
    }

    #[test]
    fn test_source_offsets_and_list() {
        let options = TechOptions {
            start: Some(5),
            end: Some(50),
            ..Default::default()
        };
        let locator = ResourceLocator::parse("https://www.youtube.com/watch?v=abc12345678&list=PL1&start=12");
        let setup = PlayerSetup::build(&options, &locator);

        assert_eq!(setup.video_id.as_deref(), Some("abc12345678"));
        assert_eq!(setup.player_vars["start"], json!(12));
        assert_eq!(setup.player_vars["end"], json!(50));
        assert_eq!(setup.list().as_deref(), Some("PL1"));
    }

    #[test]
    fn test_validation() {
        assert!(TechOptions::from_json(r#"{"techId": "  "}"#).is_err());
        assert!(TechOptions::from_json(r#"{"start": 30, "end": 10}"#).is_err());
        assert!(TechOptions::from_json(r#"{"autoplay": "yes"}"#).is_err());
        assert!(TechOptions::from_json("{}").is_ok());
    }

    #[test]
    fn test_empty_poster_is_not_explicit() {
        let options = TechOptions::from_json(r#"{"poster": ""}"#).unwrap();
        assert_eq!(options.explicit_poster(), None);

        let options = TechOptions::from_json(r#"{"poster": "https://example.com/p.jpg"}"#).unwrap();
        assert_eq!(options.explicit_poster(), Some("https://example.com/p.jpg"));
    }

    #[test]
    fn test_iframe_blocker() {
        let options = TechOptions::default();
        assert!(uses_iframe_blocker(&options, Platform::default()));

        let mobile = Platform {
            is_ios: true,
            ..Default::default()
        };
        assert!(!uses_iframe_blocker(&options, mobile));

        let native = TechOptions {
            yt_controls: Some(1),
            ..Default::default()
        };
        assert!(!uses_iframe_blocker(&native, Platform::default()));
    }
}
