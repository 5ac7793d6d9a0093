//! Operator and scenario-script commands.
//!
//! Commands are plain text: a command name followed by space-separated
//! `key=value` tokens, e.g. `reroute tunnelId=7 action=restore`.

use std::fmt;
use std::str::FromStr;
use tunnelctl_types::{ConfigError, TunnelId};

/// Direction of an operator-requested reroute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RerouteAction {
    /// Move the tunnel off its current path.
    Failover,
    /// Move the tunnel back to its primary path.
    Restore,
}

/// A parsed operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCommand {
    /// `reroute tunnelId=<id> [action=restore]`
    Reroute {
        /// Target tunnel.
        tunnel: TunnelId,
        /// Failover unless `action=restore` (or `restore=true`) was given.
        action: RerouteAction,
    },
}

impl OperatorCommand {
    /// Parse a command from its name and argument string.
    ///
    /// Unknown argument tokens are ignored. A missing or malformed
    /// `tunnelId` and unknown command names are configuration errors.
    pub fn from_parts(name: &str, args: &str) -> Result<Self, ConfigError> {
        match name {
            "reroute" => Self::parse_reroute(args),
            "" => Err(ConfigError::EmptyCommand),
            other => Err(ConfigError::UnknownCommand(other.to_string())),
        }
    }

    /// Parse a full command line.
    pub fn parse(line: &str) -> Result<Self, ConfigError> {
        let line = line.trim();
        let (name, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        Self::from_parts(name, args)
    }

    fn parse_reroute(args: &str) -> Result<Self, ConfigError> {
        let mut tunnel = None;
        let mut action = RerouteAction::Failover;

        for token in args.split_whitespace() {
            if let Some(value) = token.strip_prefix("tunnelId=") {
                let id = value
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidArgument {
                        argument: "tunnelId",
                        value: value.to_string(),
                    })?;
                tunnel = Some(TunnelId(id));
            } else if token == "action=restore" || token == "restore=true" {
                action = RerouteAction::Restore;
            }
        }

        let tunnel = tunnel.ok_or_else(|| ConfigError::MissingArgument {
            command: "reroute".to_string(),
            argument: "tunnelId",
        })?;

        Ok(OperatorCommand::Reroute { tunnel, action })
    }

    /// The tunnel this command targets.
    pub fn tunnel(&self) -> TunnelId {
        match self {
            OperatorCommand::Reroute { tunnel, .. } => *tunnel,
        }
    }
}

impl FromStr for OperatorCommand {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorCommand::Reroute { tunnel, action } => {
                let action = match action {
                    RerouteAction::Failover => "failover",
                    RerouteAction::Restore => "restore",
                };
                write!(f, "reroute tunnelId={} action={}", tunnel.0, action)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reroute_defaults_to_failover() {
        let cmd: OperatorCommand = "reroute tunnelId=7".parse().unwrap();
        assert_eq!(
            cmd,
            OperatorCommand::Reroute {
                tunnel: TunnelId(7),
                action: RerouteAction::Failover,
            }
        );
    }

    #[test]
    fn test_reroute_restore_spellings() {
        for line in [
            "reroute tunnelId=3 action=restore",
            "reroute action=restore tunnelId=3",
            "reroute tunnelId=3 restore=true",
        ] {
            let cmd = OperatorCommand::parse(line).unwrap();
            assert_eq!(
                cmd,
                OperatorCommand::Reroute {
                    tunnel: TunnelId(3),
                    action: RerouteAction::Restore,
                },
                "{line}"
            );
        }
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        let cmd = OperatorCommand::parse("reroute  tunnelId=4   note=maintenance ").unwrap();
        assert_eq!(cmd.tunnel(), TunnelId(4));
    }

    #[test]
    fn test_missing_tunnel_id() {
        assert_eq!(
            OperatorCommand::parse("reroute action=restore"),
            Err(ConfigError::MissingArgument {
                command: "reroute".to_string(),
                argument: "tunnelId",
            })
        );
    }

    #[test]
    fn test_invalid_tunnel_id() {
        assert!(matches!(
            OperatorCommand::parse("reroute tunnelId=-1"),
            Err(ConfigError::InvalidArgument { argument: "tunnelId", .. })
        ));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert_eq!(
            OperatorCommand::parse("teardown tunnelId=1"),
            Err(ConfigError::UnknownCommand("teardown".to_string()))
        );
        assert_eq!(OperatorCommand::parse("   "), Err(ConfigError::EmptyCommand));
    }

    #[test]
    fn test_display_parses_back() {
        let cmd = OperatorCommand::Reroute {
            tunnel: TunnelId(12),
            action: RerouteAction::Restore,
        };
        assert_eq!(OperatorCommand::parse(&cmd.to_string()).unwrap(), cmd);
    }
}
