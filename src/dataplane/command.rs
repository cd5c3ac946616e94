//! Operator commands received on the control channel

use std::net::Ipv4Addr;
use thiserror::Error;

/// A parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `arp`: dump the ARP table
    ShowArp,
    /// `arp <ipv4> <interface>`: send a who-has request
    Resolve { ip: Ipv4Addr, interface: String },
    /// Blank line
    Empty,
    /// Any other command word
    Other(String),
}

/// Malformed `arp` arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("`{0}' is not a valid IPv4 address")]
    InvalidAddress(String),

    #[error("No network interface provided")]
    MissingInterface,
}

/// Strip trailing NULs and line terminators from a control payload.
pub fn command_text(line: &str) -> &str {
    line.trim_end_matches(['\0', '\r', '\n'])
}

/// Parse one command line.
///
/// Tokens are separated by whitespace; trailing NULs and line terminators
/// are ignored. The command word is case-insensitive. Tokens after the
/// interface name are ignored.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut tokens = command_text(line).split_whitespace();

    let word = match tokens.next() {
        Some(word) => word,
        None => return Ok(Command::Empty),
    };

    if !word.eq_ignore_ascii_case("arp") {
        return Ok(Command::Other(word.to_string()));
    }

    let addr = match tokens.next() {
        Some(addr) => addr,
        None => return Ok(Command::ShowArp),
    };
    let ip: Ipv4Addr = addr
        .parse()
        .map_err(|_| CommandError::InvalidAddress(addr.to_string()))?;

    let interface = tokens.next().ok_or(CommandError::MissingInterface)?;

    Ok(Command::Resolve {
        ip,
        interface: interface.to_string(),
    })
}
