//! Inbound MQTT commands.
//!
//! Controller (`cmd_topic`), JSON with optional booleans:
//!
//! ```text
//! {"pump": true}                  pump on, light unchanged
//! {"pump": false, "light": true}  both set
//! ```
//!
//! Camera (`cmd_topic` of the camera node): `capture`, either as plain
//! text or as `{"action":"capture"}`.
//!
//! Parsing never panics; anything it does not understand is a
//! [`CommandError`].

use core::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Payload is not valid UTF-8 / JSON or has wrongly typed fields.
    Malformed,
    /// JSON object carried none of the known fields.
    Empty,
    /// Well-formed but names no known action.
    Unknown,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed command"),
            Self::Empty => write!(f, "command sets nothing"),
            Self::Unknown => write!(f, "unknown command"),
        }
    }
}

// ── Controller ────────────────────────────────────────────────

/// Requested relay states; `None` leaves that relay as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct RelayCommand {
    #[serde(default)]
    pub pump: Option<bool>,
    #[serde(default)]
    pub light: Option<bool>,
}

impl RelayCommand {
    pub fn is_empty(&self) -> bool {
        self.pump.is_none() && self.light.is_none()
    }
}

pub fn parse_relay_command(payload: &[u8]) -> Result<RelayCommand, CommandError> {
    let cmd: RelayCommand =
        serde_json::from_slice(payload).map_err(|_| CommandError::Malformed)?;
    if cmd.is_empty() {
        return Err(CommandError::Empty);
    }
    Ok(cmd)
}

// ── Camera ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCommand {
    /// Capture and classify now, outside the regular cadence.
    Capture,
}

#[derive(Deserialize)]
struct ActionEnvelope {
    action: heapless::String<16>,
}

pub fn parse_camera_command(payload: &[u8]) -> Result<CameraCommand, CommandError> {
    let text = core::str::from_utf8(payload).map_err(|_| CommandError::Malformed)?;
    let text = text.trim();

    let action = if text.starts_with('{') {
        let env: ActionEnvelope =
            serde_json::from_str(text).map_err(|_| CommandError::Malformed)?;
        env.action
    } else {
        let mut s = heapless::String::new();
        s.push_str(text).map_err(|_| CommandError::Unknown)?;
        s
    };

    if action.eq_ignore_ascii_case("capture") {
        Ok(CameraCommand::Capture)
    } else {
        Err(CommandError::Unknown)
    }
}
