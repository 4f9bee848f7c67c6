//! Parsing of interactive game commands

use std::path::PathBuf;

/// One player action typed at the prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Offer(i64),
    Accept,
    Reject,
    Ask(String),
    Status,
    History,
    Export(Option<PathBuf>),
    Help,
    Quit,
}

pub const HELP: &[&str] = &[
    "offer <amount>   keep <amount> for yourself, offer the rest",
    "accept | reject  respond to the pending offer",
    "ask <question>   ask the assistant about the rules",
    "status           show whose turn it is",
    "history          list this game's events",
    "export [file]    write the experiment export",
    "quit             leave the game",
];

impl Intent {
    /// Parse a prompt line. Errors carry a message for the player.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command.to_ascii_lowercase().as_str() {
            "offer" | "o" => rest
                .parse::<i64>()
                .map(Intent::Offer)
                .map_err(|_| "Usage: offer <amount>".to_string()),
            "accept" | "a" | "yes" => Ok(Intent::Accept),
            "reject" | "r" | "no" => Ok(Intent::Reject),
            "ask" | "?" => {
                if rest.is_empty() {
                    Err("Usage: ask <question>".to_string())
                } else {
                    Ok(Intent::Ask(rest.to_string()))
                }
            }
            "status" | "s" => Ok(Intent::Status),
            "history" | "h" => Ok(Intent::History),
            "export" => Ok(Intent::Export(
                Some(rest).filter(|r| !r.is_empty()).map(PathBuf::from),
            )),
            "help" => Ok(Intent::Help),
            "quit" | "exit" | "q" => Ok(Intent::Quit),
            "" => Err("Type 'help' for a list of commands".to_string()),
            other => Err(format!("Unknown command '{}'. Type 'help' for a list of commands", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offer() {
        assert_eq!(Intent::parse("offer 70"), Ok(Intent::Offer(70)));
        assert_eq!(Intent::parse("  o   -5 "), Ok(Intent::Offer(-5)));
        assert!(Intent::parse("offer lots").is_err());
        assert!(Intent::parse("offer").is_err());
    }

    #[test]
    fn test_parse_responses() {
        assert_eq!(Intent::parse("accept"), Ok(Intent::Accept));
        assert_eq!(Intent::parse("REJECT"), Ok(Intent::Reject));
        assert_eq!(Intent::parse("no"), Ok(Intent::Reject));
    }

    #[test]
    fn test_parse_ask_keeps_question() {
        assert_eq!(
            Intent::parse("ask who offers after a rejection?"),
            Ok(Intent::Ask("who offers after a rejection?".to_string()))
        );
        assert!(Intent::parse("ask").is_err());
    }

    #[test]
    fn test_parse_export() {
        assert_eq!(Intent::parse("export"), Ok(Intent::Export(None)));
        assert_eq!(
            Intent::parse("export run1.json"),
            Ok(Intent::Export(Some(PathBuf::from("run1.json"))))
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = Intent::parse("dance").unwrap_err();
        assert!(err.contains("dance"));
        assert!(Intent::parse("").is_err());
    }
}
