//! Vehicle command codes and command responses

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Commands understood by the vehicle module
///
/// The relay forwards these opaquely; which of them a given vehicle accepts
/// is announced at runtime through the capability (`V`) message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Command {
    GetFeatureList = 1,
    SetFeature = 2,
    GetParameterList = 3,
    SetParameter = 4,
    Reboot = 5,
    /// Free-form shell command text
    Shell = 7,
    SetChargeMode = 10,
    ChargeStart = 11,
    ChargeStop = 12,
    SetChargeCurrentLimit = 15,
    SetChargeModeCurrent = 16,
    WakeUpCar = 18,
    WakeUpClimateSubsystem = 19,
    Lock = 20,
    ValetEnable = 21,
    Unlock = 22,
    ValetDisable = 23,
    /// Optional parameter selects the button
    HomeLink = 24,
    /// `"1"` on, `"0"` off
    Aircon = 26,
    CellularUsage = 30,
    MmiUssd = 41,
    Modem = 49,
    SetChargeAlerts = 204,
}

impl Command {
    pub const ALL: [Command; 23] = [
        Command::GetFeatureList,
        Command::SetFeature,
        Command::GetParameterList,
        Command::SetParameter,
        Command::Reboot,
        Command::Shell,
        Command::SetChargeMode,
        Command::ChargeStart,
        Command::ChargeStop,
        Command::SetChargeCurrentLimit,
        Command::SetChargeModeCurrent,
        Command::WakeUpCar,
        Command::WakeUpClimateSubsystem,
        Command::Lock,
        Command::ValetEnable,
        Command::Unlock,
        Command::ValetDisable,
        Command::HomeLink,
        Command::Aircon,
        Command::CellularUsage,
        Command::MmiUssd,
        Command::Modem,
        Command::SetChargeAlerts,
    ];

    /// Numeric wire code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a known command by its wire code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::GetFeatureList => "get_feature_list",
            Command::SetFeature => "set_feature",
            Command::GetParameterList => "get_parameter_list",
            Command::SetParameter => "set_parameter",
            Command::Reboot => "reboot",
            Command::Shell => "shell",
            Command::SetChargeMode => "set_charge_mode",
            Command::ChargeStart => "charge_start",
            Command::ChargeStop => "charge_stop",
            Command::SetChargeCurrentLimit => "set_charge_current_limit",
            Command::SetChargeModeCurrent => "set_charge_mode_current",
            Command::WakeUpCar => "wake_up_car",
            Command::WakeUpClimateSubsystem => "wake_up_climate_subsystem",
            Command::Lock => "lock",
            Command::ValetEnable => "valet_enable",
            Command::Unlock => "unlock",
            Command::ValetDisable => "valet_disable",
            Command::HomeLink => "home_link",
            Command::Aircon => "aircon",
            Command::CellularUsage => "cellular_usage",
            Command::MmiUssd => "mmi_ussd",
            Command::Modem => "modem",
            Command::SetChargeAlerts => "set_charge_alerts",
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command.code()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Command {
    type Err = String;

    /// Accepts either the snake_case name or the numeric code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| format!("Unknown command code: {}", code));
        }
        let wanted = s.to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("Unknown command: '{}'", s))
    }
}

/// Outcome reported by the vehicle for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandResult {
    Ok,
    Failed,
    Unsupported,
    Unimplemented,
    Other(i32),
}

impl From<i32> for CommandResult {
    fn from(code: i32) -> Self {
        match code {
            0 => CommandResult::Ok,
            1 => CommandResult::Failed,
            2 => CommandResult::Unsupported,
            3 => CommandResult::Unimplemented,
            n => CommandResult::Other(n),
        }
    }
}

impl std::fmt::Display for CommandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandResult::Ok => f.write_str("ok"),
            CommandResult::Failed => f.write_str("failed"),
            CommandResult::Unsupported => f.write_str("unsupported"),
            CommandResult::Unimplemented => f.write_str("unimplemented"),
            CommandResult::Other(n) => write!(f, "result {}", n),
        }
    }
}

/// A decoded `c` message: `{command},{result}[,{text}]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command: u8,
    pub result: CommandResult,
    /// Response text, one entry per CR-separated line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
}

impl CommandResponse {
    /// Parse a command response message
    ///
    /// The text part may itself contain commas, so everything after the
    /// result code is rejoined before splitting into lines.
    pub fn from_message(msg: &Message) -> Option<Self> {
        if msg.code != 'c' || msg.params.len() < 2 {
            return None;
        }
        let command = msg.params[0].trim().parse::<u8>().ok()?;
        let result = CommandResult::from(msg.params[1].trim().parse::<i32>().ok()?);
        let lines = if msg.params.len() > 2 {
            msg.params[2..]
                .join(",")
                .split('\r')
                .map(|l| l.trim_end_matches('\n').to_string())
                .filter(|l| !l.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        Some(Self {
            command,
            result,
            lines,
        })
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_ok(&self) -> bool {
        self.result == CommandResult::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_codes() {
        assert_eq!(u8::from(Command::Shell), 7);
        assert_eq!(Command::ChargeStart.code(), 11);
        assert_eq!(Command::SetChargeAlerts.code(), 204);
        assert_eq!(Command::from_code(41), Some(Command::MmiUssd));
        assert_eq!(Command::from_code(6), None);
    }

    #[test]
    fn test_command_from_str() {
        assert_eq!("lock".parse::<Command>(), Ok(Command::Lock));
        assert_eq!("charge-start".parse::<Command>(), Ok(Command::ChargeStart));
        assert_eq!("26".parse::<Command>(), Ok(Command::Aircon));
        assert!("explode".parse::<Command>().is_err());
        assert!("6".parse::<Command>().is_err());
    }

    #[test]
    fn test_response_parse_shell_output() {
        let msg = Message::new(
            'c',
            vec!["7".into(), "0".into(), "SOC: 80%\rRange: 200, ideal".into(), " 240km".into()],
        );
        let resp = CommandResponse::from_message(&msg).unwrap();
        assert_eq!(resp.command, 7);
        assert!(resp.is_ok());
        assert_eq!(resp.lines, vec!["SOC: 80%", "Range: 200, ideal, 240km"]);
    }

    #[test]
    fn test_response_result_codes() {
        let resp =
            CommandResponse::from_message(&Message::new('c', vec!["20".into(), "2".into()]))
                .unwrap();
        assert_eq!(resp.result, CommandResult::Unsupported);
        assert!(resp.lines.is_empty());

        let resp =
            CommandResponse::from_message(&Message::new('c', vec!["20".into(), "9".into()]))
                .unwrap();
        assert_eq!(resp.result, CommandResult::Other(9));
    }

    #[test]
    fn test_response_rejects_other_messages() {
        assert!(CommandResponse::from_message(&Message::new('S', vec!["1".into(), "0".into()])).is_none());
        assert!(CommandResponse::from_message(&Message::new('c', vec!["7".into()])).is_none());
    }
}
