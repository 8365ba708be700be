//! The message queue (spec §4.7): `post`/`read`/`mark_complete`/
//! `compact` over the five-line record grammar, grounded directly on
//! `message_queue.py`'s `post_message`/`read_messages`/
//! `read_messages_for_agent`/`mark_message_complete`/`clear_old_messages`.

use crate::error::Result;
use crate::record::{Message, Priority, Status};
use crate::storage::StorageBackend;

const HEADER: &str = "=== Agent Message Queue ===\n\n";
const PLACEHOLDER: &str = "[No messages]\n\n";
const FOOTER: &str = "=== Message Format ===\n[timestamp] sender -> receiver\nTask: <description>\nPriority: low|medium|high|critical\nStatus: pending|in_progress|complete\nMetadata: <optional JSON>\n---\n";

pub struct MessageQueue<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> MessageQueue<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Appends a new message. Replaces the `[No messages]` placeholder
    /// if present; otherwise inserts before the format-documentation
    /// footer if one exists, else just appends.
    pub fn post(&self, sender: &str, receiver: &str, task: &str, priority: Priority, metadata: Option<serde_json::Value>) -> Result<()> {
        self.backend.with_blob(|content| {
            let message = Message::new(sender, receiver, task, priority, metadata);
            let block = message.to_block();

            let updated = if content.is_empty() {
                format!("{HEADER}{block}\n{FOOTER}")
            } else if content.contains(PLACEHOLDER) {
                content.replacen(PLACEHOLDER, &block, 1)
            } else if let Some(idx) = content.find(FOOTER) {
                let mut updated = content[..idx].to_string();
                updated.push_str(&block);
                updated.push('\n');
                updated.push_str(&content[idx..]);
                updated
            } else {
                format!("{content}{block}")
            };

            Ok(updated)
        })
    }

    /// Parses every record in the queue, optionally filtered to those
    /// addressed to `receiver` and/or in the given `status`.
    pub fn read(&self, receiver: Option<&str>, status: Option<Status>) -> Result<Vec<Message>> {
        let content = self.backend.read()?;
        let mut messages = parse_all(&content);
        if let Some(receiver) = receiver {
            messages.retain(|m| m.receiver == receiver);
        }
        if let Some(status) = status {
            messages.retain(|m| m.status == status);
        }
        Ok(messages)
    }

    /// Rewrites the matching record's `Status:` line to `complete`.
    /// Matches on `(sender, receiver, timestamp)`, the same triple
    /// `mark_message_complete` keys on.
    pub fn mark_complete(&self, sender: &str, receiver: &str, timestamp: &str) -> Result<()> {
        self.backend.with_blob(|content| {
            let needle = format!("[{timestamp}] {sender} -> {receiver}");
            let mut out = String::with_capacity(content.len());
            let mut found = false;
            let mut in_target_block = false;

            for line in content.split_inclusive('\n') {
                if line.contains(&needle) {
                    in_target_block = true;
                }
                if in_target_block && line.trim_start().starts_with("Status: ") {
                    out.push_str("Status: complete\n");
                    in_target_block = false;
                    found = true;
                    continue;
                }
                out.push_str(line);
            }

            if !found {
                return Err(crate::error::CoordinationError::NotFound {
                    sender: sender.to_string(),
                    receiver: receiver.to_string(),
                    timestamp: timestamp.to_string(),
                });
            }
            Ok(out)
        })
    }

    /// Keeps every pending/in-progress record plus the `keep_recent`
    /// most-recently-timestamped completed ones, rebuilding the whole
    /// document from scratch — mirrors `clear_old_messages`.
    pub fn compact(&self, keep_recent: usize) -> Result<()> {
        self.backend.with_blob(|content| {
            let messages = parse_all(&content);

            let (mut completed, pending): (Vec<Message>, Vec<Message>) = messages.into_iter().partition(|m| m.status == Status::Complete);
            completed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            completed.truncate(keep_recent);

            let mut kept: Vec<Message> = pending;
            kept.extend(completed);
            kept.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

            if kept.is_empty() {
                return Ok(format!("{HEADER}{PLACEHOLDER}{FOOTER}"));
            }

            let mut body = String::new();
            for message in &kept {
                body.push_str(&message.to_block());
            }
            Ok(format!("{HEADER}{body}\n{FOOTER}"))
        })
    }
}

fn parse_all(content: &str) -> Vec<Message> {
    content
        .split("---\n")
        .filter_map(|block| {
            let trimmed = block.trim();
            if trimmed.is_empty() || trimmed.starts_with('=') || trimmed.starts_with('[') && trimmed.contains("No messages") {
                return None;
            }
            Message::parse_block(block)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileBackend;

    fn queue(dir: &tempfile::TempDir) -> MessageQueue<FileBackend> {
        MessageQueue::new(FileBackend::new(dir.path().join("queue.txt")))
    }

    #[test]
    fn post_replaces_placeholder_on_first_message() {
        let dir = tempfile::tempdir().unwrap();
        let q = queue(&dir);
        q.post("a", "b", "do the thing", Priority::Medium, None).unwrap();
        let messages = q.read(None, None).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].task, "do the thing");
    }

    #[test]
    fn multiple_posts_all_appear() {
        let dir = tempfile::tempdir().unwrap();
        let q = queue(&dir);
        q.post("a", "b", "task one", Priority::Low, None).unwrap();
        q.post("a", "c", "task two", Priority::High, None).unwrap();
        let messages = q.read(None, None).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn read_filters_by_receiver_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let q = queue(&dir);
        q.post("a", "b", "task one", Priority::Low, None).unwrap();
        q.post("a", "c", "task two", Priority::Low, None).unwrap();

        let for_b = q.read(Some("b"), None).unwrap();
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].receiver, "b");

        let pending = q.read(None, Some(Status::Pending)).unwrap();
        assert_eq!(pending.len(), 2);
        let complete = q.read(None, Some(Status::Complete)).unwrap();
        assert!(complete.is_empty());
    }

    #[test]
    fn mark_complete_rewrites_only_the_targeted_record() {
        let dir = tempfile::tempdir().unwrap();
        let q = queue(&dir);
        q.post("a", "b", "task one", Priority::Low, None).unwrap();
        q.post("a", "b", "task two", Priority::Low, None).unwrap();

        let messages = q.read(None, None).unwrap();
        let target_ts = messages[0].timestamp.to_rfc3339();
        q.mark_complete("a", "b", &target_ts).unwrap();

        let messages = q.read(None, None).unwrap();
        let completed: Vec<_> = messages.iter().filter(|m| m.status == Status::Complete).collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].task, "task one");
    }

    #[test]
    fn mark_complete_errors_when_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let q = queue(&dir);
        q.post("a", "b", "task one", Priority::Low, None).unwrap();
        let err = q.mark_complete("x", "y", "2020-01-01T00:00:00Z").unwrap_err();
        assert!(matches!(err, crate::error::CoordinationError::NotFound { .. }));
    }

    #[test]
    fn compact_keeps_pending_and_n_most_recent_completed() {
        let dir = tempfile::tempdir().unwrap();
        let q = queue(&dir);
        q.post("a", "b", "pending task", Priority::Low, None).unwrap();
        q.post("a", "b", "complete task 1", Priority::Low, None).unwrap();
        q.post("a", "b", "complete task 2", Priority::Low, None).unwrap();

        let messages = q.read(None, None).unwrap();
        for m in messages.iter().filter(|m| m.task.starts_with("complete")) {
            let ts = m.timestamp.to_rfc3339();
            q.mark_complete("a", "b", &ts).unwrap();
        }

        q.compact(1).unwrap();
        let messages = q.read(None, None).unwrap();
        let pending: Vec<_> = messages.iter().filter(|m| m.status != Status::Complete).collect();
        let complete: Vec<_> = messages.iter().filter(|m| m.status == Status::Complete).collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(complete.len(), 1);
    }

    #[test]
    fn compact_writes_placeholder_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let q = queue(&dir);
        q.compact(10).unwrap();
        let content = q.read(None, None).unwrap();
        assert!(content.is_empty());
    }
}
