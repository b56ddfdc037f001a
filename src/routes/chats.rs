use std::collections::HashSet;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    chat::{ChatEvent, ClientEvent},
    dto::chats::{
        ChatData, ChatsList, CreateChatRequest, MaybeChatData, MessageData, MessagesList,
        SendMessageRequest,
    },
    error::AppResult,
    middleware::{auth::AuthUser, validate::ValidatedJson},
    response::ApiResponse,
    routes::params::Pagination,
    services::chat_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_chats).post(create_chat))
        .route("/ws", get(chat_socket))
        .route("/with/{receiver_id}", get(get_chat_with))
        .route("/{chat_id}/messages", get(list_messages).post(send_message))
}

#[utoipa::path(
    get,
    path = "/v1/chats",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "The caller's chats, most recent first", body = ApiResponse<ChatsList>)
    ),
    security(("cookie_auth" = [])),
    tag = "Chats"
)]
pub async fn list_chats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ChatsList>>> {
    let resp = chat_service::list_chats(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/v1/chats",
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Chat created", body = ApiResponse<ChatData>),
        (status = 400, description = "Chat already exists"),
        (status = 404, description = "Receiver not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Chats"
)]
pub async fn create_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateChatRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = chat_service::create_chat(&state, &user, payload.receiver_id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/v1/chats/with/{receiver_id}",
    params(
        ("receiver_id" = Uuid, Path, description = "The other participant")
    ),
    responses(
        (status = 200, description = "The shared chat, or null", body = ApiResponse<MaybeChatData>)
    ),
    security(("cookie_auth" = [])),
    tag = "Chats"
)]
pub async fn get_chat_with(
    State(state): State<AppState>,
    user: AuthUser,
    Path(receiver_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MaybeChatData>>> {
    let resp = chat_service::get_chat_with(&state, &user, receiver_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/chats/{chat_id}/messages",
    params(
        ("chat_id" = Uuid, Path, description = "Chat ID")
    ),
    responses(
        (status = 200, description = "Messages, oldest first", body = ApiResponse<MessagesList>),
        (status = 404, description = "Chat not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Chats"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MessagesList>>> {
    let resp = chat_service::list_messages(&state, &user, chat_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/v1/chats/{chat_id}/messages",
    params(
        ("chat_id" = Uuid, Path, description = "Chat ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored and fanned out", body = ApiResponse<MessageData>),
        (status = 404, description = "Chat not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Chats"
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = chat_service::send_message(&state, &user, chat_id, payload.content).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// Realtime relay socket. Connecting marks the user online; `joinChat`
/// frames subscribe the socket to a chat's messages, `sendMessage` frames
/// persist and fan out through the hub.
pub async fn chat_socket(
    State(state): State<AppState>,
    user: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, user, socket))
}

async fn handle_socket(state: AppState, user: AuthUser, mut socket: WebSocket) {
    let hub = state.chat.clone();
    hub.connect(user.user_id).await;

    let greeting =
        serde_json::json!({ "type": "activeUsers", "users": hub.active_users().await });
    if socket
        .send(WsMessage::Text(greeting.to_string().into()))
        .await
        .is_err()
    {
        hub.disconnect(user.user_id).await;
        return;
    }

    let mut events = hub.subscribe();
    let mut joined: HashSet<Uuid> = HashSet::new();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let deliver = match &event {
                        ChatEvent::NewMessage { chat_id, .. } => joined.contains(chat_id),
                        ChatEvent::UserStatus { .. } => true,
                    };
                    if deliver {
                        let Ok(frame) = serde_json::to_string(&event) else { continue };
                        if socket.send(WsMessage::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "chat subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(ClientEvent::JoinChat { chat_id }) => {
                            match chat_service::is_participant(&state, chat_id, user.user_id).await {
                                Ok(true) => {
                                    joined.insert(chat_id);
                                }
                                Ok(false) => {}
                                Err(err) => tracing::warn!(error = %err, "join chat failed"),
                            }
                        }
                        Ok(ClientEvent::SendMessage { chat_id, content }) => {
                            if let Err(err) =
                                chat_service::send_message(&state, &user, chat_id, content).await
                            {
                                tracing::warn!(error = %err, "socket message rejected");
                            }
                        }
                        Err(_) => {}
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    hub.disconnect(user.user_id).await;
}
