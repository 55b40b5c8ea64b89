use serde::Deserialize;
use strum::{Display, FromRepr};

use crate::error::{Error, Result};

/// Coarse game status reported by RockSniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Display)]
#[repr(u8)]
pub enum GameState {
    NotFound = 0,
    InMenu = 1,
    LoadingSong = 3,
    InSong = 4,
    SongEnded = 5,
}

impl GameState {
    /// Map a raw `currentState` code. Codes outside {0,1,3,4,5} are rejected.
    pub fn from_code(code: i64) -> Result<Self> {
        u8::try_from(code)
            .ok()
            .and_then(Self::from_repr)
            .ok_or_else(|| Error::Protocol(format!("unknown currentState {}", code)))
    }

    /// True while a song is loading or being played
    pub fn is_active(&self) -> bool {
        matches!(self, Self::LoadingSong | Self::InSong)
    }
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(rename = "currentState")]
    current_state: i64,
}

/// Parse a RockSniffer status document into a [`GameState`].
pub fn parse_state(body: &str) -> Result<GameState> {
    let payload: StatusPayload =
        serde_json::from_str(body).map_err(|e| Error::Protocol(e.to_string()))?;
    GameState::from_code(payload.current_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(GameState::from_code(0).unwrap(), GameState::NotFound);
        assert_eq!(GameState::from_code(1).unwrap(), GameState::InMenu);
        assert_eq!(GameState::from_code(3).unwrap(), GameState::LoadingSong);
        assert_eq!(GameState::from_code(4).unwrap(), GameState::InSong);
        assert_eq!(GameState::from_code(5).unwrap(), GameState::SongEnded);
    }

    #[test]
    fn test_from_code_rejects_gaps() {
        for code in [-1, 2, 6, 256, i64::MAX] {
            let err = GameState::from_code(code).unwrap_err();
            assert!(matches!(err, Error::Protocol(_)), "code {}", code);
        }
    }

    #[test]
    fn test_is_active() {
        assert!(GameState::LoadingSong.is_active());
        assert!(GameState::InSong.is_active());
        assert!(!GameState::NotFound.is_active());
        assert!(!GameState::InMenu.is_active());
        assert!(!GameState::SongEnded.is_active());
    }

    #[test]
    fn test_parse_state_ignores_extra_fields() {
        let body = r#"{"success":true,"currentState":4,"memoryReadout":{"songTimer":12.5}}"#;
        assert_eq!(parse_state(body).unwrap(), GameState::InSong);
    }

    #[test]
    fn test_parse_state_invalid_payloads() {
        assert!(matches!(parse_state("<html>"), Err(Error::Protocol(_))));
        assert!(matches!(parse_state(r#"{"success":true}"#), Err(Error::Protocol(_))));
        assert!(matches!(
            parse_state(r#"{"currentState":"4"}"#),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            parse_state(r#"{"currentState":2}"#),
            Err(Error::Protocol(_))
        ));
    }
}
