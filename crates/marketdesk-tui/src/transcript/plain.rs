//! Plain-text projection of the transcript, for line mode.

use marketdesk_engine::Message;

use super::render::{metadata_tags, time_str, CONTENT_INDENT};

/// Format one message as `[HH:MM] ROLE: text`, continuation lines indented.
pub fn format_message(message: &Message) -> String {
    let mut lines = message.content.lines();
    let first = lines.next().unwrap_or("");

    let mut out = format!("[{}] {}: {first}", time_str(message), message.role.label());
    for line in lines {
        out.push('\n');
        out.push_str(CONTENT_INDENT);
        out.push_str(line);
    }

    if let Some(metadata) = &message.metadata {
        let tags = metadata_tags(metadata);
        if !tags.is_empty() {
            out.push('\n');
            out.push_str(CONTENT_INDENT);
            out.push_str(&tags.join("  "));
        }
    }

    out
}

/// Format a whole log, one message after another.
pub fn format_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(format_message)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use marketdesk_engine::{MessageId, MessageMetadata, Role};

    #[test]
    fn test_plain_transcript() {
        let messages = vec![
            Message::new(
                MessageId(1),
                Role::Assistant,
                "Hello! I'm your AI market analysis assistant.",
            ),
            Message::new(MessageId(2), Role::User, "What is AAPL doing?\nAnd TSLA?"),
            Message::new(
                MessageId(3),
                Role::Assistant,
                "I'm analyzing the market data for your query.",
            )
            .with_metadata(Some(MessageMetadata::for_symbol("AAPL"))),
            Message::new(
                MessageId(4),
                Role::Error,
                "Error: Backend failed: service unavailable",
            ),
        ];

        insta::with_settings!({filters => vec![(r"\[\d{2}:\d{2}\]", "[HH:MM]")]}, {
            assert_snapshot!("plain_transcript", format_transcript(&messages));
        });
    }

    #[test]
    fn test_format_message_without_metadata_is_single_line() {
        let msg = Message::new(MessageId(1), Role::User, "hi");
        let text = format_message(&msg);
        assert!(text.ends_with("] YOU: hi"));
        assert!(!text.contains('\n'));
    }
}
