//! The five-line message record grammar (spec §4.7), matching
//! `message_queue.py`'s `post_message`/`read_messages` format byte for
//! byte where it matters (header line, `Task:`/`Priority:`/`Status:`/
//! `Metadata:` field lines, `---` delimiter).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl std::str::FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Complete,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Complete => "complete",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

impl std::str::FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "complete" => Ok(Status::Complete),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub receiver: String,
    pub task: String,
    pub priority: Priority,
    pub status: Status,
    pub metadata: Option<Value>,
}

impl Message {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, task: impl Into<String>, priority: Priority, metadata: Option<Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            sender: sender.into(),
            receiver: receiver.into(),
            task: task.into(),
            priority,
            status: Status::Pending,
            metadata,
        }
    }

    /// Renders this record as a block in the five-line grammar,
    /// terminated by the `---` delimiter `message_queue.py` uses to
    /// split blocks back apart.
    pub fn to_block(&self) -> String {
        let mut block = format!(
            "[{}] {} -> {}\nTask: {}\nPriority: {}\nStatus: {}\n",
            self.timestamp.to_rfc3339(),
            self.sender,
            self.receiver,
            self.task,
            self.priority.as_str(),
            self.status.as_str(),
        );
        if let Some(metadata) = &self.metadata {
            block.push_str(&format!("Metadata: {}\n", metadata));
        }
        block.push_str("---\n");
        block
    }

    /// Parses a single `---`-delimited block back into a [`Message`].
    /// Mirrors `read_messages`'s tolerant field-by-field scan: unknown
    /// or missing `Priority`/`Status` lines fall back to their
    /// defaults, and an unparseable `Metadata:` line is silently
    /// dropped rather than failing the whole record.
    pub fn parse_block(block: &str) -> Option<Message> {
        let lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() < 4 {
            return None;
        }

        let header = lines[0];
        let (timestamp_part, rest) = header.split_once("] ")?;
        let timestamp_str = timestamp_part.strip_prefix('[')?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp_str).ok()?.with_timezone(&Utc);
        let (sender, receiver) = rest.split_once(" -> ")?;

        let mut task = None;
        let mut priority = Priority::default();
        let mut status = Status::default();
        let mut metadata = None;

        for line in &lines[1..] {
            if let Some(value) = line.strip_prefix("Task: ") {
                task = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Priority: ") {
                priority = value.parse().unwrap_or_default();
            } else if let Some(value) = line.strip_prefix("Status: ") {
                status = value.parse().unwrap_or_default();
            } else if let Some(value) = line.strip_prefix("Metadata: ") {
                metadata = serde_json::from_str(value).ok();
            }
        }

        Some(Message { timestamp, sender: sender.to_string(), receiver: receiver.to_string(), task: task?, priority, status, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_basic_message() {
        let msg = Message::new("librarian", "indexer", "reindex paper 42", Priority::High, None);
        let parsed = Message::parse_block(&msg.to_block()).expect("should parse");
        assert_eq!(parsed.sender, "librarian");
        assert_eq!(parsed.receiver, "indexer");
        assert_eq!(parsed.task, "reindex paper 42");
        assert_eq!(parsed.priority, Priority::High);
        assert_eq!(parsed.status, Status::Pending);
    }

    #[test]
    fn round_trips_metadata() {
        let msg = Message::new("a", "b", "task", Priority::Low, Some(serde_json::json!({"paper_id": "abc"})));
        let parsed = Message::parse_block(&msg.to_block()).expect("should parse");
        assert_eq!(parsed.metadata, Some(serde_json::json!({"paper_id": "abc"})));
    }

    #[test]
    fn defaults_unparseable_priority_and_status() {
        let block = "[2024-01-01T00:00:00Z] a -> b\nTask: do thing\nPriority: urgent\nStatus: whatever\n---\n";
        let parsed = Message::parse_block(block).expect("should still parse");
        assert_eq!(parsed.priority, Priority::Medium);
        assert_eq!(parsed.status, Status::Pending);
    }

    #[test]
    fn rejects_block_missing_required_lines() {
        let block = "[2024-01-01T00:00:00Z] a -> b\nTask: do thing\n---\n";
        assert!(Message::parse_block(block).is_none());
    }

    #[test]
    fn drops_unparseable_metadata_without_failing() {
        let block = "[2024-01-01T00:00:00Z] a -> b\nTask: do thing\nPriority: low\nStatus: pending\nMetadata: not json\n---\n";
        let parsed = Message::parse_block(block).expect("should parse");
        assert_eq!(parsed.metadata, None);
    }
}
