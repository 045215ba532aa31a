//! Stdin control protocol.
//!
//! One command per line. The four literal tokens below switch visibility or
//! end the process; any other line, empty ones included, becomes the text
//! shown by the overlay.

pub mod channel;
pub mod listener;

pub use channel::{ChannelClosed, CommandReceiver, CommandSink, command_channel};
pub use listener::CommandListener;

/// A single instruction decoded from the control stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Show,
    Hide,
    Exit,
    /// Replace the displayed text with this exact content.
    SetText(String),
}

impl Command {
    /// Classify an already-decoded line.
    ///
    /// Matching is exact and case-sensitive: `"Show"` or `" show"` are text.
    pub fn from_line(line: String) -> Self {
        match line.as_str() {
            "toggle" => Command::Toggle,
            "show" => Command::Show,
            "hide" => Command::Hide,
            "exit" => Command::Exit,
            _ => Command::SetText(line),
        }
    }
}

/// Decode one raw line read from the control stream.
///
/// The trailing `\n` is removed together with a `\r` right before it. Invalid
/// UTF-8 is replaced with U+FFFD instead of failing.
pub fn decode_line(raw: &[u8]) -> String {
    let body = raw.strip_suffix(b"\n").unwrap_or(raw);
    let body = body.strip_suffix(b"\r").unwrap_or(body);
    String::from_utf8_lossy(body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognizes_control_tokens() {
        assert_eq!(Command::from_line("toggle".into()), Command::Toggle);
        assert_eq!(Command::from_line("show".into()), Command::Show);
        assert_eq!(Command::from_line("hide".into()), Command::Hide);
        assert_eq!(Command::from_line("exit".into()), Command::Exit);
    }

    #[test]
    fn tokens_are_case_sensitive_and_untrimmed() {
        assert_eq!(
            Command::from_line("Show".into()),
            Command::SetText("Show".into())
        );
        assert_eq!(
            Command::from_line(" hide".into()),
            Command::SetText(" hide".into())
        );
        assert_eq!(
            Command::from_line("exit ".into()),
            Command::SetText("exit ".into())
        );
    }

    #[test]
    fn empty_line_sets_empty_text() {
        assert_eq!(decode_line(b"\n"), "");
        assert_eq!(
            Command::from_line(decode_line(b"\n")),
            Command::SetText(String::new())
        );
    }

    #[test]
    fn strips_only_the_line_terminator() {
        assert_eq!(decode_line(b"  padded  \n"), "  padded  ");
        assert_eq!(decode_line(b"windows\r\n"), "windows");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"inner\rcr\n"), "inner\rcr");
    }

    #[test]
    fn well_formed_utf8_survives_decoding() {
        let text = "Größe: 42 °C, 東京, 🚀";
        let mut raw = text.as_bytes().to_vec();
        raw.push(b'\n');
        assert_eq!(
            Command::from_line(decode_line(&raw)),
            Command::SetText(text.to_string())
        );
    }

    #[test]
    fn malformed_utf8_becomes_replacement_characters() {
        let decoded = decode_line(b"ok \xff\xfe end\n");
        assert_eq!(decoded, "ok \u{fffd}\u{fffd} end");
    }
}
