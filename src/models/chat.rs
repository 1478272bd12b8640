use chrono::Utc;
use serde::{ Serialize, Deserialize };
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Delivered,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub from_user: bool,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_words: Option<Vec<String>>,
    pub timestamp: i64,
}

impl Message {
    pub fn user(text: &str) -> Self {
        Self::new(format!("user-{}", Uuid::new_v4()), text, true, MessageStatus::Pending)
    }

    pub fn tutor(text: &str) -> Self {
        Self::new(format!("ai-{}", Uuid::new_v4()), text, false, MessageStatus::Delivered)
    }

    pub fn with_id(id: &str, text: &str, from_user: bool) -> Self {
        Self::new(id.to_string(), text, from_user, MessageStatus::Delivered)
    }

    fn new(id: String, text: &str, from_user: bool, status: MessageStatus) -> Self {
        Self {
            id,
            text: text.to_string(),
            from_user,
            status,
            flagged_words: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == MessageStatus::Failed
    }
}
