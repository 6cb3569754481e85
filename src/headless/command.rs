//! Stdin command parsing

use std::str::FromStr;

use locswitch_core::prelude::*;
use locswitch_core::{Coordinate, MovementType};

/// One line of operator input
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessCommand {
    /// List configured devices and the selection
    Devices,
    /// Choose a device by id
    Select(String),
    /// Report that a device went away
    Disconnect(String),
    /// Override the active device's location
    Set(Coordinate),
    /// Clear the override
    Reset,
    /// Change the movement type
    Move(MovementType),
    /// Move the active device to the host's location
    Host,
    /// Print a snapshot of the coordinator
    Status,
    Quit,
}

impl FromStr for HeadlessCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err(Error::invalid_command("empty command"));
        };
        let args: Vec<&str> = parts.collect();

        let command = match (verb, args.as_slice()) {
            ("devices" | "ls", []) => HeadlessCommand::Devices,
            ("select", [id]) => HeadlessCommand::Select(id.to_string()),
            ("disconnect", [id]) => HeadlessCommand::Disconnect(id.to_string()),
            ("set", [lat, lon]) => HeadlessCommand::Set(parse_coordinate(lat, lon)?),
            ("reset", []) => HeadlessCommand::Reset,
            ("move", [kind]) => HeadlessCommand::Move(kind.parse()?),
            ("host", []) => HeadlessCommand::Host,
            ("status", []) => HeadlessCommand::Status,
            ("q" | "quit" | "exit", []) => HeadlessCommand::Quit,
            ("select" | "disconnect", _) => {
                return Err(Error::invalid_command(format!("usage: {} <device-id>", verb)))
            }
            ("set", _) => return Err(Error::invalid_command("usage: set <latitude> <longitude>")),
            ("move", _) => return Err(Error::invalid_command("usage: move <walk|cycle|drive>")),
            _ => return Err(Error::invalid_command(format!("unknown command '{}'", line))),
        };
        Ok(command)
    }
}

fn parse_coordinate(lat: &str, lon: &str) -> Result<Coordinate> {
    let parse = |s: &str| {
        s.trim_end_matches(',')
            .parse::<f64>()
            .map_err(|_| Error::invalid_command(format!("'{}' is not a number", s)))
    };
    let coordinate = Coordinate::new(parse(lat)?, parse(lon)?);
    if !coordinate.is_valid() {
        return Err(Error::invalid_command(format!(
            "{} is outside latitude -90..90 / longitude -180..180",
            coordinate
        )));
    }
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<HeadlessCommand> {
        line.parse()
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("devices").unwrap(), HeadlessCommand::Devices);
        assert_eq!(parse("  reset ").unwrap(), HeadlessCommand::Reset);
        assert_eq!(parse("host").unwrap(), HeadlessCommand::Host);
        assert_eq!(parse("status").unwrap(), HeadlessCommand::Status);
        assert_eq!(parse("q").unwrap(), HeadlessCommand::Quit);
    }

    #[test]
    fn test_select_and_disconnect() {
        assert_eq!(
            parse("select 00008110-001A").unwrap(),
            HeadlessCommand::Select("00008110-001A".to_string())
        );
        assert_eq!(
            parse("disconnect abc").unwrap(),
            HeadlessCommand::Disconnect("abc".to_string())
        );
        assert!(parse("select").is_err());
        assert!(parse("select a b").is_err());
    }

    #[test]
    fn test_set_coordinate() {
        assert_eq!(
            parse("set 37.3349 -122.009").unwrap(),
            HeadlessCommand::Set(Coordinate::new(37.3349, -122.009))
        );
        assert_eq!(
            parse("set 1.5, 2.5").unwrap(),
            HeadlessCommand::Set(Coordinate::new(1.5, 2.5))
        );
    }

    #[test]
    fn test_set_rejects_bad_input() {
        assert!(matches!(
            parse("set north 1").unwrap_err(),
            Error::InvalidCommand { .. }
        ));
        assert!(parse("set 91 0").is_err());
        assert!(parse("set 1").is_err());
    }

    #[test]
    fn test_move() {
        assert_eq!(
            parse("move drive").unwrap(),
            HeadlessCommand::Move(MovementType::Drive)
        );
        assert!(parse("move teleport").is_err());
    }

    #[test]
    fn test_unknown_and_empty() {
        let err = parse("fly away").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
        assert!(parse("   ").is_err());
    }
}
