//! Keyword auto-reply bot.
//!
//! A stored question is a template: `{{a|b|c}}` stands for any one of the
//! alternatives and every other character is matched literally. Matching is
//! case-insensitive and runs against the trimmed customer message.

use crate::constants::chat;
use crate::database::{BotReplyRecord, MatchType};
use crate::messages;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    OneOf(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(question: &str) -> Self {
        let lowered = question.trim().to_lowercase();
        let mut segments = Vec::new();
        let mut rest = lowered.as_str();

        while !rest.is_empty() {
            let Some(open) = rest.find("{{") else {
                segments.push(Segment::Literal(rest.to_string()));
                break;
            };
            let Some(close) = rest[open + 2..].find("}}") else {
                // Unterminated group is plain text
                segments.push(Segment::Literal(rest.to_string()));
                break;
            };

            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let options = &rest[open + 2..open + 2 + close];
            segments.push(Segment::OneOf(
                options.split('|').map(|o| o.to_string()).collect(),
            ));
            rest = &rest[open + 2 + close + 2..];
        }

        Self { segments }
    }

    /// Byte offsets in `text` where a match starting at `start` can end
    fn match_ends(&self, text: &str, start: usize) -> Vec<usize> {
        let mut positions = vec![start];

        for segment in &self.segments {
            let mut next = Vec::new();
            for &pos in &positions {
                let remaining = &text[pos..];
                match segment {
                    Segment::Literal(literal) => {
                        if remaining.starts_with(literal.as_str()) {
                            next.push(pos + literal.len());
                        }
                    }
                    Segment::OneOf(options) => {
                        for option in options {
                            if remaining.starts_with(option.as_str()) {
                                next.push(pos + option.len());
                            }
                        }
                    }
                }
            }
            next.sort_unstable();
            next.dedup();
            if next.is_empty() {
                return next;
            }
            positions = next;
        }

        positions
    }

    pub fn matches(&self, message: &str, match_type: MatchType) -> bool {
        let text = message.trim().to_lowercase();

        match match_type {
            MatchType::Exact => self.match_ends(&text, 0).contains(&text.len()),
            MatchType::Partial => text
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .any(|start| !self.match_ends(&text, start).is_empty()),
        }
    }
}

/// First stored reply whose template matches the message
pub fn find_reply<'a>(replies: &'a [BotReplyRecord], message: &str) -> Option<&'a BotReplyRecord> {
    replies
        .iter()
        .find(|reply| Template::parse(&reply.question).matches(message, reply.match_type))
}

/// Text the bot posts after a customer message, if any
pub fn auto_reply(
    replies: &[BotReplyRecord],
    message: &str,
    is_first_customer_message: bool,
) -> Option<String> {
    match find_reply(replies, message) {
        Some(reply) => Some(messages::bot_reply(&reply.answer)),
        None if is_first_customer_message => Some(messages::bot_reply(chat::FIRST_MESSAGE_REPLY)),
        None => None,
    }
}
