//! Power commands understood by the controller

/// A power command to apply to an outlet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerCommand {
    /// Switch the outlet on
    #[default]
    On,
    /// Switch the outlet off
    Off,
    /// Cycle the outlet off and back on
    Reset,
}

impl PowerCommand {
    /// The single character code sent to the controller for this command
    pub fn code(&self) -> char {
        match self {
            PowerCommand::On => '1',
            PowerCommand::Off => '0',
            PowerCommand::Reset => 'T',
        }
    }

    /// The name of the command as given on the command line
    pub fn name(&self) -> &'static str {
        match self {
            PowerCommand::On => "on",
            PowerCommand::Off => "off",
            PowerCommand::Reset => "reset",
        }
    }
}

impl core::fmt::Display for PowerCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown command name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommandError(pub String);

impl core::fmt::Display for UnknownCommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Unrecognized command {}", self.0)
    }
}
impl core::error::Error for UnknownCommandError {}

impl core::str::FromStr for PowerCommand {
    type Err = UnknownCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(PowerCommand::On),
            "off" => Ok(PowerCommand::Off),
            "reset" => Ok(PowerCommand::Reset),
            other => Err(UnknownCommandError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!('1', PowerCommand::On.code());
        assert_eq!('0', PowerCommand::Off.code());
        assert_eq!('T', PowerCommand::Reset.code());
        assert_eq!(PowerCommand::On, PowerCommand::default());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Ok(PowerCommand::Off), "off".parse());
        assert_eq!(Ok(PowerCommand::Reset), "reset".parse());
        let err = "cycle".parse::<PowerCommand>().unwrap_err();
        assert_eq!("Unrecognized command cycle", err.to_string());
    }
}
