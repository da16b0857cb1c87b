//! Chat transcript detection and formatting for recognized text.
//!
//! Each line is tried against an ordered list of line matchers; the first
//! match wins. A line that matches nothing while a message is open is appended
//! to that message, unless it looks like the start of a `Name:` line.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const BANNER_WIDTH: usize = 60;

/// Shape of a chat line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinePattern {
    /// `Name: message`
    NameColon,
    /// `[Time] Name: message` or `(Time) Name: message`
    TimeThenName,
    /// `Name [Time]: message`
    NameThenTime,
    /// `Name (Time) message`
    NameTimeNoColon,
    /// `Name` alone on a line
    NameOnly,
    /// `HH:MM Name: message`
    ClockThenName,
}

struct LineMatcher {
    pattern: LinePattern,
    regex: Regex,
    speaker: usize,
    timestamp: Option<usize>,
    message: Option<usize>,
}

fn matcher(
    pattern: LinePattern,
    re: &str,
    speaker: usize,
    timestamp: Option<usize>,
    message: Option<usize>,
) -> LineMatcher {
    LineMatcher {
        pattern,
        regex: Regex::new(re).expect("static regex"),
        speaker,
        timestamp,
        message,
    }
}

static LINE_MATCHERS: Lazy<Vec<LineMatcher>> = Lazy::new(|| {
    vec![
        matcher(
            LinePattern::NameColon,
            r"^([A-Z][a-zA-Z\s]{0,30})\s*:\s*(.+)$",
            1,
            None,
            Some(2),
        ),
        matcher(
            LinePattern::TimeThenName,
            r"^[\[\(]([0-9:APM\s]+)[\]\)]\s*([A-Z][a-zA-Z\s]{0,30})\s*:\s*(.+)$",
            2,
            Some(1),
            Some(3),
        ),
        matcher(
            LinePattern::NameThenTime,
            r"^([A-Z][a-zA-Z\s]{0,30})\s*[\[\(]([0-9:APM\s]+)[\]\)]\s*:\s*(.+)$",
            1,
            Some(2),
            Some(3),
        ),
        matcher(
            LinePattern::NameTimeNoColon,
            r"^([A-Z][a-zA-Z\s]{0,30})\s*[\[\(]([0-9:APM\s]+)[\]\)]\s+(.+)$",
            1,
            Some(2),
            Some(3),
        ),
        matcher(
            LinePattern::NameOnly,
            r"^([A-Z][a-zA-Z\s]{0,30})$",
            1,
            None,
            None,
        ),
        matcher(
            LinePattern::ClockThenName,
            r"^([0-9]{1,2}:[0-9]{2}\s*(?:AM|PM)?)\s+([A-Z][a-zA-Z\s]{0,30})\s*:\s*(.+)$",
            2,
            Some(1),
            Some(3),
        ),
    ]
});

static TIME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b([0-9]{1,2}:[0-9]{2}\s*(?:AM|PM)?)\b").expect("static regex"),
        Regex::new(r"\b([0-9]{1,2}:[0-9]{2}:[0-9]{2})\b").expect("static regex"),
    ]
});

static SPEAKER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-zA-Z\s]*:").expect("static regex"));

/// Patterns counted as chat evidence by [`ChatDetector::is_likely_chat`].
const DETECTION_ORDER: [LinePattern; 3] = [
    LinePattern::NameColon,
    LinePattern::TimeThenName,
    LinePattern::NameThenTime,
];

/// Patterns that open a message during extraction, in priority order.
const EXTRACTION_ORDER: [LinePattern; 4] = [
    LinePattern::NameColon,
    LinePattern::TimeThenName,
    LinePattern::NameThenTime,
    LinePattern::ClockThenName,
];

/// Raw speakers this long or longer are not accepted by the `Name:` pattern.
const MAX_SPEAKER_CHARS: usize = 30;

fn line_matcher(pattern: LinePattern) -> &'static LineMatcher {
    LINE_MATCHERS
        .iter()
        .find(|m| m.pattern == pattern)
        .expect("every pattern has a matcher")
}

/// One message recovered from a transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: String,
    /// Message body; continuation lines are joined with `\n`.
    pub message: String,
    pub timestamp: Option<String>,
    /// Zero-based index of the opening line in the input.
    pub line_number: usize,
}

/// Per-conversation statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationSummary {
    pub total_messages: usize,
    /// Speakers in order of first appearance.
    pub participants: Vec<String>,
    pub message_counts: HashMap<String, usize>,
    pub has_timestamps: bool,
}

/// Result of [`ChatDetector::process_text`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatOutcome {
    pub is_chat: bool,
    /// Formatted transcript when a chat was detected, else the input text.
    pub text: String,
    pub summary: Option<ConversationSummary>,
}

/// Detects chat transcripts and reformats them.
#[derive(Clone, Debug)]
pub struct ChatDetector {
    /// Evidence per line above which text counts as a chat.
    pub min_evidence_ratio: f64,
    /// Fewer non-empty lines than this never count as a chat.
    pub min_lines: usize,
}

impl Default for ChatDetector {
    fn default() -> Self {
        Self {
            min_evidence_ratio: 0.3,
            min_lines: 3,
        }
    }
}

impl ChatDetector {
    /// Scores the text for chat evidence.
    ///
    /// A line scores 1 when it opens a message in one of the common shapes,
    /// plus 0.5 when it contains a clock time.
    pub fn is_likely_chat(&self, text: &str) -> bool {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() < self.min_lines {
            return false;
        }

        let mut evidence = 0.0f64;
        for line in &lines {
            if DETECTION_ORDER
                .iter()
                .any(|&p| line_matcher(p).regex.is_match(line))
            {
                evidence += 1.0;
            }
            if TIME_PATTERNS.iter().any(|re| re.is_match(line)) {
                evidence += 0.5;
            }
        }
        evidence / lines.len() as f64 > self.min_evidence_ratio
    }

    /// Splits text into messages.
    pub fn extract_messages(&self, text: &str) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> = Vec::new();
        for (line_number, raw) in text.split('\n').enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(message) = open_message(line, line_number) {
                messages.push(message);
                continue;
            }

            if let Some(current) = messages.last_mut() {
                if !SPEAKER_PREFIX_RE.is_match(line) {
                    current.message.push('\n');
                    current.message.push_str(line);
                }
            }
        }
        messages
    }

    /// Renders messages as an indented transcript with a banner and footer.
    ///
    /// With `include_timestamps`, speakers that carry a time are printed as
    /// `[time] Speaker:`.
    pub fn format_conversation(
        &self,
        messages: &[ChatMessage],
        include_timestamps: bool,
    ) -> String {
        if messages.is_empty() {
            return String::new();
        }

        let rule = "=".repeat(BANNER_WIDTH);
        let mut out = vec![rule.clone(), "CHAT CONVERSATION".to_string(), rule.clone()];
        out.push(String::new());

        for msg in messages {
            let header = match (&msg.timestamp, include_timestamps) {
                (Some(ts), true) => format!("[{ts}] {}:", msg.speaker),
                _ => format!("{}:", msg.speaker),
            };
            out.push(header);
            for line in msg.message.split('\n') {
                out.push(format!("  {line}"));
            }
            out.push(String::new());
        }

        out.push(rule.clone());
        out.push(format!("Total messages: {}", messages.len()));
        out.push(rule);
        out.join("\n")
    }

    /// Counts messages per speaker.
    pub fn summarize(&self, messages: &[ChatMessage]) -> ConversationSummary {
        let mut summary = ConversationSummary {
            total_messages: messages.len(),
            ..ConversationSummary::default()
        };
        for msg in messages {
            let count = summary.message_counts.entry(msg.speaker.clone()).or_insert(0);
            if *count == 0 {
                summary.participants.push(msg.speaker.clone());
            }
            *count += 1;
            summary.has_timestamps |= msg.timestamp.is_some();
        }
        summary
    }

    /// Reformats `text` as a transcript when it looks like a chat.
    ///
    /// Falls back to the original text when detection fails or no message
    /// could be extracted.
    pub fn process_text(&self, text: &str) -> ChatOutcome {
        let passthrough = || ChatOutcome {
            is_chat: false,
            text: text.to_string(),
            summary: None,
        };
        if !self.is_likely_chat(text) {
            return passthrough();
        }
        let messages = self.extract_messages(text);
        if messages.is_empty() {
            return passthrough();
        }

        let summary = self.summarize(&messages);
        let header = format!(
            "Detected chat conversation with {} messages\nParticipants: {}\n\n",
            summary.total_messages,
            summary.participants.join(", ")
        );
        ChatOutcome {
            is_chat: true,
            text: header + &self.format_conversation(&messages, true),
            summary: Some(summary),
        }
    }
}

fn open_message(line: &str, line_number: usize) -> Option<ChatMessage> {
    for pattern in EXTRACTION_ORDER {
        let m = line_matcher(pattern);
        let Some(caps) = m.regex.captures(line) else {
            continue;
        };
        let raw_speaker = caps.get(m.speaker).map_or("", |g| g.as_str());
        if pattern == LinePattern::NameColon {
            let chars = raw_speaker.chars().count();
            if chars == 0 || chars >= MAX_SPEAKER_CHARS {
                continue;
            }
        }
        let group = |idx: Option<usize>| {
            idx.and_then(|i| caps.get(i))
                .map(|g| g.as_str().trim().to_string())
        };
        return Some(ChatMessage {
            speaker: raw_speaker.trim().to_string(),
            message: group(m.message).unwrap_or_default(),
            timestamp: group(m.timestamp),
            line_number,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{open_message, LinePattern, LINE_MATCHERS};

    #[test]
    fn matchers_are_listed_in_priority_order() {
        let order: Vec<LinePattern> = LINE_MATCHERS.iter().map(|m| m.pattern).collect();
        assert_eq!(
            order,
            [
                LinePattern::NameColon,
                LinePattern::TimeThenName,
                LinePattern::NameThenTime,
                LinePattern::NameTimeNoColon,
                LinePattern::NameOnly,
                LinePattern::ClockThenName,
            ]
        );
    }

    #[test]
    fn name_colon_wins_over_later_patterns() {
        let msg = open_message("Bob: at 2:30 PM", 4).unwrap();
        assert_eq!(msg.speaker, "Bob");
        assert_eq!(msg.message, "at 2:30 PM");
        assert_eq!(msg.timestamp, None);
        assert_eq!(msg.line_number, 4);
    }

    #[test]
    fn bracketed_time_is_captured() {
        let msg = open_message("[2:31 PM] Bob: Working on a new project", 0).unwrap();
        assert_eq!(msg.speaker, "Bob");
        assert_eq!(msg.timestamp.as_deref(), Some("2:31 PM"));

        let msg = open_message("Carol (10:05): see you", 0).unwrap();
        assert_eq!(msg.speaker, "Carol");
        assert_eq!(msg.timestamp.as_deref(), Some("10:05"));

        let msg = open_message("9:15 AM Dave: morning", 0).unwrap();
        assert_eq!(msg.speaker, "Dave");
        assert_eq!(msg.timestamp.as_deref(), Some("9:15 AM"));
        assert_eq!(msg.message, "morning");
    }

    #[test]
    fn overlong_speaker_is_not_a_name_colon_line() {
        let line = format!("A{}: hello", "b".repeat(29));
        assert!(open_message(&line, 0).is_none());
    }

    #[test]
    fn plain_sentences_do_not_open_messages() {
        assert!(open_message("just some words here", 0).is_none());
        assert!(open_message("Name only", 0).is_none());
    }
}
