//! Slash-command parsing for the input line.
//!
//! Anything not starting with `/` is chat text. `//` escapes a leading slash.

/// Parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/who`: refresh the online list.
    Who,
    /// `/rename <name>`.
    Rename {
        /// Requested name.
        name: String,
    },
    /// `/public`: switch to public chat.
    Public,
    /// `/private [name]`: switch to private chat, optionally picking a target.
    Private {
        /// Target to select.
        target: Option<String>,
    },
    /// `/to <name>`: pick a private target.
    To {
        /// Target to select.
        name: String,
    },
    /// `/quit` or `/exit`.
    Quit,
    /// Chat text.
    Message {
        /// Text to send.
        text: String,
    },
    /// Unrecognised slash command.
    Unknown {
        /// The input as typed.
        input: String,
    },
    /// Known command with bad arguments.
    InvalidArgs {
        /// Command name without the slash.
        command: &'static str,
        /// What is wrong.
        error: &'static str,
    },
}

/// Parse one input line.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    let Some(body) = input.strip_prefix('/') else {
        return Command::Message { text: input.to_owned() };
    };
    if body.starts_with('/') {
        return Command::Message { text: body.to_owned() };
    }

    let (name, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
    let rest = rest.trim();

    match name {
        "who" => Command::Who,
        "rename" if rest.is_empty() => {
            Command::InvalidArgs { command: "rename", error: "usage: /rename <name>" }
        },
        "rename" => Command::Rename { name: rest.to_owned() },
        "public" => Command::Public,
        "private" => Command::Private { target: (!rest.is_empty()).then(|| rest.to_owned()) },
        "to" if rest.is_empty() => {
            Command::InvalidArgs { command: "to", error: "usage: /to <name>" }
        },
        "to" => Command::To { name: rest.to_owned() },
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown { input: input.to_owned() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse("  hello world "), Command::Message { text: "hello world".into() });
    }

    #[test]
    fn double_slash_escapes() {
        assert_eq!(parse("//who"), Command::Message { text: "/who".into() });
    }

    #[test]
    fn commands_with_arguments() {
        assert_eq!(parse("/rename  bob "), Command::Rename { name: "bob".into() });
        assert_eq!(parse("/to carol"), Command::To { name: "carol".into() });
        assert_eq!(parse("/private"), Command::Private { target: None });
        assert_eq!(parse("/private dave"), Command::Private { target: Some("dave".into()) });
    }

    #[test]
    fn missing_arguments() {
        assert!(matches!(parse("/rename"), Command::InvalidArgs { command: "rename", .. }));
        assert!(matches!(parse("/to   "), Command::InvalidArgs { command: "to", .. }));
    }

    #[test]
    fn bare_commands() {
        assert_eq!(parse("/who"), Command::Who);
        assert_eq!(parse("/public"), Command::Public);
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("/exit"), Command::Quit);
        assert_eq!(parse("/dance"), Command::Unknown { input: "/dance".into() });
    }
}
