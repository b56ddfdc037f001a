use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Chat, Message};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    pub receiver_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "Message content is required"))]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatData {
    pub chat: Chat,
}

/// `chat` is null when the two users share no chat yet.
#[derive(Debug, Serialize, ToSchema)]
pub struct MaybeChatData {
    pub chat: Option<Chat>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatsList {
    pub chats: Vec<Chat>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageData {
    pub message: Message,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessagesList {
    pub messages: Vec<Message>,
}
