use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

// Define an enum for message types

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    Error,
    Warning,
    Info,
    Priority,
    Status,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message_type_str = match self {
            MessageType::Error => "Error",
            MessageType::Warning => "Warning",
            MessageType::Info => "Info",
            MessageType::Priority => "Priority",
            MessageType::Status => "Status",
        };
        f.pad(message_type_str)
    }
}

impl MessageType {
    fn color(&self) -> &'static str {
        match self {
            MessageType::Error => "\x1b[31m",
            MessageType::Warning => "\x1b[33m",
            MessageType::Info => "\x1b[0m",
            MessageType::Priority => "\x1b[32m",
            MessageType::Status => "\x1b[36m",
        }
    }
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub timestamp: DateTime<Utc>,
    pub message_type: MessageType,
    pub content: String,
}

impl StatusMessage {
    pub fn new(message_type: MessageType, content: String) -> Self {
        StatusMessage {
            timestamp: Utc::now(),
            message_type,
            content,
        }
    }
}

pub struct MessageLog {
    messages: VecDeque<StatusMessage>,
    headless: bool,
    max_size: usize,
}

impl MessageLog {
    pub fn new(headless: bool, max_size: Option<usize>) -> Self {
        MessageLog {
            messages: VecDeque::new(),
            headless,
            max_size: max_size.unwrap_or(500).max(1),
        }
    }

    /// A log wrapped for sharing between the capture callback and the tick path.
    pub fn shared(headless: bool, max_size: Option<usize>) -> SharedLog {
        Arc::new(Mutex::new(MessageLog::new(headless, max_size)))
    }

    pub fn add_message(&mut self, message: StatusMessage) {
        if self.messages.len() == self.max_size {
            self.messages.pop_front();
        }

        if self.headless {
            let white = "\x1b[0m";
            println!(
                "{}{} | {:^8} | {}{}",
                message.message_type.color(),
                message.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                message.message_type,
                message.content,
                white,
            )
        }

        self.messages.push_back(message);
    }

    pub fn get_all_messages(&self) -> Vec<StatusMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.content.contains(needle))
    }

    pub fn count_of(&self, message_type: MessageType) -> usize {
        self.messages
            .iter()
            .filter(|m| m.message_type == message_type)
            .count()
    }

    pub fn size(&self) -> usize {
        self.messages.len()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

pub type SharedLog = Arc<Mutex<MessageLog>>;

/// Append to a shared log. A poisoned lock still accepts messages.
pub fn report(log: &SharedLog, message_type: MessageType, content: String) {
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .add_message(StatusMessage::new(message_type, content));
}
