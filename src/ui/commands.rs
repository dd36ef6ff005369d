use std::str::FromStr;

use crate::store::Perspective;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start a new conversation
    New,
    /// Rename the active conversation
    Rename,
    /// Delete the active conversation
    Delete,
    /// Edit the perspective tags of the active conversation
    Perspectives,
    /// Upload a file to the import endpoint
    Upload,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Perspective tags given as an argument, e.g. `/perspectives us,eu`.
    /// Returns None when the argument is missing or contains an unknown tag.
    pub fn perspective_targets(&self) -> Option<Vec<Perspective>> {
        if self.command != SlashCommand::Perspectives {
            return None;
        }

        let arg = self.argument()?;
        let mut targets = Vec::new();
        for token in arg.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            targets.push(Perspective::from_str(token).ok()?);
        }

        if targets.is_empty() { None } else { Some(targets) }
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "start a new conversation",
            SlashCommand::Rename => "rename the active conversation: /rename <title>",
            SlashCommand::Delete => "delete the active conversation",
            SlashCommand::Perspectives => "edit perspectives: /perspectives [us,eu,...]",
            SlashCommand::Upload => "upload a file: /upload <path>",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].split_whitespace();
    let head = parts.next()?;
    let rest: Vec<String> = parts.map(|s| s.to_string()).collect();

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "n" => Some(SlashCommand::New),
        "r" => Some(SlashCommand::Rename),
        "d" | "del" => Some(SlashCommand::Delete),
        "p" | "perspective" => Some(SlashCommand::Perspectives),
        "u" => Some(SlashCommand::Upload),
        "h" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Commands: ");
    let entries: Vec<String> = SlashCommand::iter()
        .map(|command| format!("/{}", command.command()))
        .collect();
    help.push_str(&entries.join(" "));
    help.push_str("  ·  while confirming: y approve, n reject");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        let parsed = parse_slash_command("/new").unwrap();
        assert_eq!(parsed.command, SlashCommand::New);
        assert_eq!(parsed.argument, None);
    }

    #[test]
    fn parses_arguments() {
        let parsed = parse_slash_command("/rename Q3 threat sweep").unwrap();
        assert_eq!(parsed.command, SlashCommand::Rename);
        assert_eq!(parsed.argument.as_deref(), Some("Q3 threat sweep"));
    }

    #[test]
    fn resolves_aliases() {
        assert_eq!(parse_slash_command("/q").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("/n").unwrap().command, SlashCommand::New);
        assert_eq!(
            parse_slash_command("/perspective us").unwrap().command,
            SlashCommand::Perspectives
        );
    }

    #[test]
    fn non_slash_input_is_not_a_command() {
        assert_eq!(parse_slash_command("hello /new"), None);
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert_eq!(parse_slash_command("/frobnicate"), None);
    }

    #[test]
    fn perspective_targets_parse_mixed_separators() {
        let parsed = parse_slash_command("/perspectives us, eu norway").unwrap();
        assert_eq!(
            parsed.perspective_targets(),
            Some(vec![Perspective::Us, Perspective::Eu, Perspective::Norway])
        );
    }

    #[test]
    fn unknown_perspective_tag_invalidates_the_argument() {
        let parsed = parse_slash_command("/perspectives us,atlantis").unwrap();
        assert_eq!(parsed.perspective_targets(), None);
    }

    #[test]
    fn perspectives_without_argument_yields_none() {
        let parsed = parse_slash_command("/perspectives").unwrap();
        assert_eq!(parsed.perspective_targets(), None);
    }
}
