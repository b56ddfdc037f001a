use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    chat::ChatEvent,
    dto::chats::{ChatData, ChatsList, MaybeChatData, MessageData, MessagesList},
    entity::{
        chat_participants::{self, Column as ParticipantCol, Entity as ChatParticipants},
        chats::{self, ChatKind, Column as ChatCol, Entity as Chats},
        messages::{self, Column as MessageCol, Entity as Messages},
        users::{Column as UserCol, Entity as Users, UserRole},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Chat, ChatParticipant, Message},
    response::ApiResponse,
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_chats(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ChatsList>> {
    let (_, limit, offset) = pagination.normalize();

    let memberships = ChatParticipants::find()
        .filter(ParticipantCol::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?;
    let chat_ids: Vec<Uuid> = memberships.iter().map(|m| m.chat_id).collect();

    let chat_models = Chats::find()
        .filter(ChatCol::Id.is_in(chat_ids))
        .order_by_desc(ChatCol::UpdatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let chats = with_participants(state, chat_models).await?;
    Ok(ApiResponse::success(ChatsList { chats }))
}

/// The chat shared by the caller and one other user, if it exists.
pub async fn get_chat_with(
    state: &AppState,
    user: &AuthUser,
    receiver_id: Uuid,
) -> AppResult<ApiResponse<MaybeChatData>> {
    let chat = find_chat_between(state, user.user_id, receiver_id).await?;
    let chat = match chat {
        Some(model) => with_participants(state, vec![model]).await?.pop(),
        None => None,
    };
    Ok(ApiResponse::success(MaybeChatData { chat }))
}

pub async fn create_chat(
    state: &AppState,
    user: &AuthUser,
    receiver_id: Uuid,
) -> AppResult<ApiResponse<ChatData>> {
    let receiver = Users::find_by_id(receiver_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Receiver"))?;

    if find_chat_between(state, user.user_id, receiver_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Chat already exists".into()));
    }

    let kind = if user.role == UserRole::Admin || receiver.role == UserRole::Admin {
        ChatKind::SellerAdmin
    } else {
        ChatKind::BuyerSeller
    };

    let txn = state.orm.begin().await?;
    let chat = create_chat_between(
        &txn,
        kind,
        (user.user_id, user.role),
        (receiver.id, receiver.role),
    )
    .await?;
    txn.commit().await?;

    let chat = with_participants(state, vec![chat])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("chat vanished after insert")))?;

    Ok(ApiResponse::success(ChatData { chat }))
}

pub async fn list_messages(
    state: &AppState,
    user: &AuthUser,
    chat_id: Uuid,
) -> AppResult<ApiResponse<MessagesList>> {
    ensure_participant(state, chat_id, user.user_id).await?;

    let messages = Messages::find()
        .filter(MessageCol::ChatId.eq(chat_id))
        .order_by_asc(MessageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(message_from_entity)
        .collect();

    Ok(ApiResponse::success(MessagesList { messages }))
}

/// Persist a message, bump the chat's most-recent-message snippet, and fan
/// the message out to connected sockets.
pub async fn send_message(
    state: &AppState,
    user: &AuthUser,
    chat_id: Uuid,
    content: String,
) -> AppResult<ApiResponse<MessageData>> {
    ensure_participant(state, chat_id, user.user_id).await?;

    let txn = state.orm.begin().await?;

    let chat = Chats::find_by_id(chat_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Chat"))?;
    let mut chat_active: chats::ActiveModel = chat.into();
    chat_active.most_recent_message = Set(Some(content.clone()));
    chat_active.updated_at = Set(Utc::now().into());
    chat_active.update(&txn).await?;

    let message = messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        chat_id: Set(chat_id),
        sender_id: Set(user.user_id),
        content: Set(content),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    let message = message_from_entity(message);
    state.chat.publish(ChatEvent::NewMessage {
        chat_id,
        message: message.clone(),
    });

    Ok(ApiResponse::success(MessageData { message }))
}

pub(crate) async fn is_participant(
    state: &AppState,
    chat_id: Uuid,
    user_id: Uuid,
) -> AppResult<bool> {
    let membership = ChatParticipants::find()
        .filter(ParticipantCol::ChatId.eq(chat_id))
        .filter(ParticipantCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?;
    Ok(membership.is_some())
}

async fn ensure_participant(state: &AppState, chat_id: Uuid, user_id: Uuid) -> AppResult<()> {
    if !is_participant(state, chat_id, user_id).await? {
        return Err(AppError::not_found("Chat"));
    }
    Ok(())
}

pub(crate) async fn create_chat_between<C: ConnectionTrait>(
    conn: &C,
    kind: ChatKind,
    (user_a, role_a): (Uuid, UserRole),
    (user_b, role_b): (Uuid, UserRole),
) -> AppResult<chats::Model> {
    let chat = chats::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(kind),
        most_recent_message: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    for (user_id, role) in [(user_a, role_a), (user_b, role_b)] {
        chat_participants::ActiveModel {
            chat_id: Set(chat.id),
            user_id: Set(user_id),
            role: Set(role),
        }
        .insert(conn)
        .await?;
    }

    Ok(chat)
}

/// Two-sided membership lookup; the double join is simpler in plain SQL.
async fn find_chat_between(
    state: &AppState,
    user_a: Uuid,
    user_b: Uuid,
) -> AppResult<Option<chats::Model>> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT c.id
        FROM chats c
        JOIN chat_participants a ON a.chat_id = c.id AND a.user_id = $1
        JOIN chat_participants b ON b.chat_id = c.id AND b.user_id = $2
        LIMIT 1
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(&state.pool)
    .await?;

    match row {
        Some((chat_id,)) => Ok(Chats::find_by_id(chat_id).one(&state.orm).await?),
        None => Ok(None),
    }
}

async fn with_participants(
    state: &AppState,
    models: Vec<chats::Model>,
) -> AppResult<Vec<Chat>> {
    let ids: Vec<Uuid> = models.iter().map(|chat| chat.id).collect();
    let participant_rows = ChatParticipants::find()
        .filter(ParticipantCol::ChatId.is_in(ids))
        .all(&state.orm)
        .await?;

    let mut by_chat: HashMap<Uuid, Vec<ChatParticipant>> = HashMap::new();
    for row in participant_rows {
        by_chat.entry(row.chat_id).or_default().push(ChatParticipant {
            user: row.user_id,
            role: row.role,
        });
    }

    Ok(models
        .into_iter()
        .map(|model| Chat {
            id: model.id,
            participants: by_chat.remove(&model.id).unwrap_or_default(),
            chat_type: model.kind,
            most_recent_message: model.most_recent_message,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
        .collect())
}

pub(crate) fn message_from_entity(model: messages::Model) -> Message {
    Message {
        id: model.id,
        chat: model.chat_id,
        sender: model.sender_id,
        content: model.content,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
