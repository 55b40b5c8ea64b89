//! Settings file handling.
//!
//! Settings live in an INI file with three sections:
//!
//! - `[obs]` (alias `[controller]`): `host`, `port`, `password` (alias `secret`)
//! - `[rocksniffer]` (alias `[gamestate]`): `host`, `port`, optional `timeout`
//! - `[behaviour]`: `mode`, `main_scene`, `song_scene`, `menu_scene`,
//!   `sources`, `source_states`, optional `poll_interval`
//!
//! A missing file is replaced by one holding the defaults below. A file that
//! exists but is incomplete is rejected; nothing is filled in for it.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ini::{EscapePolicy, Ini, ParseOption, Properties};
use strum::{Display, EnumString};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub mod defaults {
    pub const OBS_HOST: &str = "localhost";
    pub const OBS_PORT: u16 = 4455;
    pub const OBS_PASSWORD: &str = "password";
    pub const SNIFFER_HOST: &str = "localhost";
    pub const SNIFFER_PORT: u16 = 9938;
    pub const MODE: i64 = 0;
    pub const MAIN_SCENE: &str = "Main Scene";
    pub const SONG_SCENE: &str = "Song Scene";
    pub const MENU_SCENE: &str = "Menu Scene";
    pub const SOURCES: &str = "Source 1,Source 2";
    pub const SOURCE_STATES: &str = "off,on";
    pub const SNIFFER_TIMEOUT_SECS: u64 = 5;
    pub const POLL_INTERVAL_MS: u64 = 1000;
}

const CONTROLLER_SECTIONS: [&str; 2] = ["obs", "controller"];
const SNIFFER_SECTIONS: [&str; 2] = ["rocksniffer", "gamestate"];
const BEHAVIOUR_SECTION: &str = "behaviour";

/// What the switcher does with game state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Mode {
    #[default]
    SwitchScenes,
    ToggleSources,
}

impl Mode {
    /// `1` toggles sources; every other value switches scenes.
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            Self::ToggleSources
        } else {
            Self::SwitchScenes
        }
    }
}

/// Configured `on`/`off` word for a source.
///
/// `On` sources are shown while a song is loading or playing, `Off` sources
/// are shown the rest of the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SourceState {
    #[strum(serialize = "on")]
    On,
    #[strum(serialize = "off")]
    Off,
}

impl SourceState {
    pub fn desired_visibility(&self, game_active: bool) -> bool {
        match self {
            Self::On => game_active,
            Self::Off => !game_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRule {
    pub name: String,
    pub state: SourceState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub host: String,
    pub port: u16,
    /// Empty means the server has authentication disabled
    pub password: String,
}

impl ControllerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnifferSettings {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl SnifferSettings {
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Behaviour {
    pub mode: Mode,
    pub main_scene: String,
    pub song_scene: String,
    pub menu_scene: String,
    pub sources: Vec<SourceRule>,
    pub poll_interval: Duration,
}

impl Behaviour {
    /// Scenes the switcher is allowed to switch away from
    pub fn is_managed_scene(&self, scene: &str) -> bool {
        scene == self.menu_scene || scene == self.song_scene
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub controller: ControllerSettings,
    pub sniffer: SnifferSettings,
    pub behaviour: Behaviour,
}

impl Settings {
    /// Load settings, writing the default file first if `path` does not exist.
    ///
    /// Returns the settings and whether a default file was created.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        let created = if path.exists() {
            false
        } else {
            write_default(path)?;
            info!("Created default config at {}", path.display());
            true
        };
        Ok((Self::load(path)?, created))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let settings = Self::parse(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        // Values are taken literally: no backslash escapes, no quote stripping
        let option = ParseOption {
            enabled_escape: false,
            enabled_quote: false,
            ..ParseOption::default()
        };
        let ini =
            Ini::load_from_str_opt(content, option).map_err(|e| Error::config(e.to_string()))?;

        let obs = section(&ini, &CONTROLLER_SECTIONS)?;
        let controller = ControllerSettings {
            host: required(obs, "obs", "host")?.to_string(),
            port: parse_value(obs, "obs", "port")?,
            password: obs
                .get("password")
                .or_else(|| obs.get("secret"))
                .ok_or_else(|| Error::config("missing key 'password' in [obs]"))?
                .to_string(),
        };

        let sniff = section(&ini, &SNIFFER_SECTIONS)?;
        let sniffer = SnifferSettings {
            host: required(sniff, "rocksniffer", "host")?.to_string(),
            port: parse_value(sniff, "rocksniffer", "port")?,
            timeout: Duration::from_secs(
                parse_positive(sniff, "rocksniffer", "timeout")?
                    .unwrap_or(defaults::SNIFFER_TIMEOUT_SECS),
            ),
        };

        let beh = section(&ini, &[BEHAVIOUR_SECTION])?;
        let sources = parse_sources(
            required(beh, BEHAVIOUR_SECTION, "sources")?,
            required(beh, BEHAVIOUR_SECTION, "source_states")?,
        )?;
        let behaviour = Behaviour {
            mode: Mode::from_code(parse_value(beh, BEHAVIOUR_SECTION, "mode")?),
            main_scene: required(beh, BEHAVIOUR_SECTION, "main_scene")?.to_string(),
            song_scene: required(beh, BEHAVIOUR_SECTION, "song_scene")?.to_string(),
            menu_scene: required(beh, BEHAVIOUR_SECTION, "menu_scene")?.to_string(),
            sources,
            poll_interval: Duration::from_millis(
                parse_positive(beh, BEHAVIOUR_SECTION, "poll_interval")?
                    .unwrap_or(defaults::POLL_INTERVAL_MS),
            ),
        };

        Ok(Self {
            controller,
            sniffer,
            behaviour,
        })
    }
}

/// Write the default settings file to `path`.
pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
    let mut ini = Ini::new();
    ini.with_section(Some("obs"))
        .set("host", defaults::OBS_HOST)
        .set("port", defaults::OBS_PORT.to_string())
        .set("password", defaults::OBS_PASSWORD);
    ini.with_section(Some("rocksniffer"))
        .set("host", defaults::SNIFFER_HOST)
        .set("port", defaults::SNIFFER_PORT.to_string());
    ini.with_section(Some(BEHAVIOUR_SECTION))
        .set("mode", defaults::MODE.to_string())
        .set("main_scene", defaults::MAIN_SCENE)
        .set("song_scene", defaults::SONG_SCENE)
        .set("menu_scene", defaults::MENU_SCENE)
        .set("sources", defaults::SOURCES)
        .set("source_states", defaults::SOURCE_STATES);
    let path = path.as_ref();
    ini.write_to_file_policy(path, EscapePolicy::Nothing)
        .map_err(|e| Error::config(format!("cannot write {}: {}", path.display(), e)))
}

fn section<'a>(ini: &'a Ini, names: &[&str]) -> Result<&'a Properties> {
    names
        .iter()
        .find_map(|name| ini.section(Some(*name)))
        .ok_or_else(|| Error::config(format!("missing section [{}]", names[0])))
}

fn required<'a>(props: &'a Properties, section: &str, key: &str) -> Result<&'a str> {
    props
        .get(key)
        .ok_or_else(|| Error::config(format!("missing key '{}' in [{}]", key, section)))
}

fn parse_value<T: FromStr>(props: &Properties, section: &str, key: &str) -> Result<T> {
    let raw = required(props, section, key)?;
    raw.trim().parse().map_err(|_| {
        Error::config(format!("invalid value '{}' for '{}' in [{}]", raw, key, section))
    })
}

fn parse_optional<T: FromStr>(props: &Properties, section: &str, key: &str) -> Result<Option<T>> {
    match props.get(key) {
        Some(_) => parse_value(props, section, key).map(Some),
        None => Ok(None),
    }
}

/// Optional duration key; zero is rejected.
fn parse_positive(props: &Properties, section: &str, key: &str) -> Result<Option<u64>> {
    match parse_optional::<u64>(props, section, key)? {
        Some(0) => Err(Error::config(format!(
            "'{}' in [{}] must be greater than 0",
            key, section
        ))),
        value => Ok(value),
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_sources(names: &str, states: &str) -> Result<Vec<SourceRule>> {
    let names = split_list(names);
    let states = split_list(states);
    if names.len() != states.len() {
        return Err(Error::config(format!(
            "'sources' has {} entries but 'source_states' has {}",
            names.len(),
            states.len()
        )));
    }

    let mut seen = HashSet::new();
    names
        .into_iter()
        .zip(states)
        .map(|(name, state)| {
            if !seen.insert(name) {
                return Err(Error::config(format!("source '{}' listed twice", name)));
            }
            let state = SourceState::from_str(state).map_err(|_| {
                Error::config(format!(
                    "invalid state '{}' for source '{}' (expected on/off)",
                    state, name
                ))
            })?;
            Ok(SourceRule {
                name: name.to_string(),
                state,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
[obs]
host = 192.168.1.20
port = 4456
password = hunter2

[rocksniffer]
host = localhost
port = 9938

[behaviour]
mode = 1
main_scene = Main
song_scene = Song
menu_scene = Menu
sources = Overlay, Webcam
source_states = on, OFF
";

    #[test]
    fn test_parse_full() {
        let settings = Settings::parse(FULL).unwrap();
        assert_eq!(settings.controller.address(), "192.168.1.20:4456");
        assert_eq!(settings.controller.password, "hunter2");
        assert_eq!(settings.sniffer.url(), "http://localhost:9938/");
        assert_eq!(settings.sniffer.timeout, Duration::from_secs(5));
        assert_eq!(settings.behaviour.mode, Mode::ToggleSources);
        assert_eq!(settings.behaviour.main_scene, "Main");
        assert_eq!(settings.behaviour.poll_interval, Duration::from_secs(1));
        assert_eq!(
            settings.behaviour.sources,
            vec![
                SourceRule {
                    name: "Overlay".into(),
                    state: SourceState::On
                },
                SourceRule {
                    name: "Webcam".into(),
                    state: SourceState::Off
                },
            ]
        );
    }

    #[test]
    fn test_section_and_key_aliases() {
        let content = "\
[controller]
host = localhost
port = 4455
secret = abc

[gamestate]
host = localhost
port = 9000
timeout = 2

[behaviour]
mode = 0
main_scene = Main
song_scene = Song
menu_scene = Menu
sources =
source_states =
poll_interval = 250
";
        let settings = Settings::parse(content).unwrap();
        assert_eq!(settings.controller.password, "abc");
        assert_eq!(settings.sniffer.port, 9000);
        assert_eq!(settings.sniffer.timeout, Duration::from_secs(2));
        assert_eq!(settings.behaviour.mode, Mode::SwitchScenes);
        assert!(settings.behaviour.sources.is_empty());
        assert_eq!(settings.behaviour.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(Mode::from_code(0), Mode::SwitchScenes);
        assert_eq!(Mode::from_code(1), Mode::ToggleSources);
        assert_eq!(Mode::from_code(7), Mode::SwitchScenes);
    }

    #[test]
    fn test_missing_behaviour_section() {
        let content = FULL.split("[behaviour]").next().unwrap();
        let err = Settings::parse(content).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("[behaviour]"));
    }

    #[test]
    fn test_missing_key() {
        let content = FULL.replace("menu_scene = Menu\n", "");
        let err = Settings::parse(&content).unwrap_err();
        assert!(err.to_string().contains("menu_scene"));
    }

    #[test]
    fn test_invalid_port() {
        let content = FULL.replace("port = 4456", "port = obs");
        assert!(Settings::parse(&content).unwrap_err().is_config());
    }

    #[test]
    fn test_source_list_length_mismatch() {
        let content = FULL.replace("source_states = on, OFF", "source_states = on");
        let err = Settings::parse(&content).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("2 entries"));
    }

    #[test]
    fn test_invalid_source_state() {
        let content = FULL.replace("source_states = on, OFF", "source_states = on, maybe");
        assert!(Settings::parse(&content).unwrap_err().is_config());
    }

    #[test]
    fn test_duplicate_source() {
        let content = FULL.replace("sources = Overlay, Webcam", "sources = Overlay, Overlay");
        assert!(Settings::parse(&content).unwrap_err().is_config());
    }

    #[test]
    fn test_values_are_read_literally() {
        let content = FULL
            .replace("password = hunter2", r"password = ab\cd")
            .replace("main_scene = Main", r#"main_scene = "Main""#)
            .replace("sources = Overlay, Webcam", r"sources = C:\cam, Webcam");
        let settings = Settings::parse(&content).unwrap();
        assert_eq!(settings.controller.password, r"ab\cd");
        assert_eq!(settings.behaviour.main_scene, "\"Main\"");
        assert_eq!(settings.behaviour.sources[0].name, r"C:\cam");
    }

    #[test]
    fn test_zero_durations_rejected() {
        let content = FULL.replace("mode = 1", "mode = 1\npoll_interval = 0");
        let err = Settings::parse(&content).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("poll_interval"));

        let content = FULL.replace("port = 9938", "port = 9938\ntimeout = 0");
        assert!(Settings::parse(&content).unwrap_err().is_config());
    }

    #[test]
    fn test_desired_visibility() {
        assert!(SourceState::On.desired_visibility(true));
        assert!(!SourceState::On.desired_visibility(false));
        assert!(!SourceState::Off.desired_visibility(true));
        assert!(SourceState::Off.desired_visibility(false));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let (settings, created) = Settings::load_or_create(&path).unwrap();
        assert!(created);
        assert!(path.exists());
        assert_eq!(settings.controller.address(), "localhost:4455");
        assert_eq!(settings.controller.password, "password");
        assert_eq!(settings.sniffer.url(), "http://localhost:9938/");
        assert_eq!(settings.behaviour.mode, Mode::SwitchScenes);
        assert_eq!(settings.behaviour.song_scene, "Song Scene");
        assert_eq!(settings.behaviour.sources.len(), 2);
        assert_eq!(settings.behaviour.sources[0].name, "Source 1");
        assert_eq!(settings.behaviour.sources[0].state, SourceState::Off);
        assert_eq!(settings.behaviour.sources[1].state, SourceState::On);

        let (reloaded, created) = Settings::load_or_create(&path).unwrap();
        assert!(!created);
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_default_file_write_failure_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("config.ini");

        let err = Settings::load_or_create(&path).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("cannot write"));
    }

    #[test]
    fn test_default_file_round_trips_literally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        write_default(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("main_scene=Main Scene"));
        assert!(content.contains("sources=Source 1,Source 2"));
    }

    #[test]
    fn test_load_or_create_keeps_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        let broken = FULL.split("[behaviour]").next().unwrap();
        fs::write(&path, broken).unwrap();

        let err = Settings::load_or_create(&path).unwrap_err();
        assert!(err.is_config());
        assert_eq!(fs::read_to_string(&path).unwrap(), broken);
    }
}
