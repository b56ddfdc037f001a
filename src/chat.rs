//! In-memory chat relay: presence map plus a broadcast channel that fans
//! new messages and status changes out to connected sockets. Process-local
//! and non-durable; presence is lost on restart and not shared across
//! instances.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::models::Message;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Server-to-client events, serialized as `{"type": "...", ...}` frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatEvent {
    #[serde(rename_all = "camelCase")]
    NewMessage { chat_id: Uuid, message: Message },
    #[serde(rename_all = "camelCase")]
    UserStatus {
        user_id: Uuid,
        status: PresenceStatus,
    },
}

/// Client-to-server frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinChat { chat_id: Uuid },
    #[serde(rename_all = "camelCase")]
    SendMessage { chat_id: Uuid, content: String },
}

pub struct ChatHub {
    events: broadcast::Sender<ChatEvent>,
    // connection count per user; a user with several tabs stays online
    // until the last socket closes
    online: RwLock<HashMap<Uuid, u32>>,
}

impl ChatHub {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            online: RwLock::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Best-effort fanout; lagging subscribers drop events.
    pub fn publish(&self, event: ChatEvent) {
        let _ = self.events.send(event);
    }

    pub async fn connect(&self, user_id: Uuid) {
        let mut online = self.online.write().await;
        let count = online.entry(user_id).or_insert(0);
        *count += 1;
        if *count == 1 {
            drop(online);
            self.publish(ChatEvent::UserStatus {
                user_id,
                status: PresenceStatus::Online,
            });
        }
    }

    pub async fn disconnect(&self, user_id: Uuid) {
        let mut online = self.online.write().await;
        if let Some(count) = online.get_mut(&user_id) {
            *count -= 1;
            if *count == 0 {
                online.remove(&user_id);
                drop(online);
                self.publish(ChatEvent::UserStatus {
                    user_id,
                    status: PresenceStatus::Offline,
                });
            }
        }
    }

    pub async fn active_users(&self) -> Vec<Uuid> {
        self.online.read().await.keys().copied().collect()
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn presence_counts_connections_per_user() {
        let hub = ChatHub::new();
        let user = Uuid::new_v4();

        hub.connect(user).await;
        hub.connect(user).await;
        assert_eq!(hub.active_users().await, vec![user]);

        hub.disconnect(user).await;
        assert_eq!(hub.active_users().await, vec![user]);

        hub.disconnect(user).await;
        assert!(hub.active_users().await.is_empty());
    }

    #[tokio::test]
    async fn going_online_emits_a_status_event() {
        let hub = ChatHub::new();
        let user = Uuid::new_v4();
        let mut rx = hub.subscribe();

        hub.connect(user).await;
        match rx.recv().await.unwrap() {
            ChatEvent::UserStatus { user_id, status } => {
                assert_eq!(user_id, user);
                assert_eq!(status, PresenceStatus::Online);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
