use axum_marketplace_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::RegisterRequest,
    entity::{
        chat_participants::{Column as ParticipantCol, Entity as ChatParticipants},
        chats::{ChatKind, Entity as Chats},
        shops::{Column as ShopCol, Entity as Shops, ShopActivityStatus, ShopPaymentStatus},
        users::{ActiveModel as UserActive, UserRole},
    },
    error::AppError,
    services::auth_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };
    if std::env::var("JWT_SECRET").is_err() {
        eprintln!("Skipping test: set JWT_SECRET to run registration flow tests.");
        return Ok(None);
    }

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    Ok(Some(AppState::new(pool, orm)))
}

fn register_request(email: &str, role: Option<UserRole>) -> RegisterRequest {
    RegisterRequest {
        username: "newcomer".into(),
        email: email.into(),
        password: "a-long-password".into(),
        role,
    }
}

// Seller registration carries side effects: a pending shop and a support
// chat with the admin. Buyer registration carries none.
#[tokio::test]
async fn seller_registration_creates_shop_and_support_chat() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    // seed an admin for the support chat
    let admin_id = Uuid::new_v4();
    UserActive {
        id: Set(admin_id),
        username: Set("admin".into()),
        email: Set(format!("admin-{admin_id}@example.com")),
        password_hash: Set("not-a-real-hash".into()),
        address: Set(None),
        avatar_url: Set(None),
        role: Set(UserRole::Admin),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let email = format!("seller-{}@example.com", Uuid::new_v4());
    let (token, resp) =
        auth_service::register_user(&state, register_request(&email, Some(UserRole::Seller)))
            .await?;
    assert!(!token.is_empty());
    let user = resp.data.user;
    assert_eq!(user.role, UserRole::Seller);

    let shop = Shops::find()
        .filter(ShopCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?
        .expect("seller shop should exist");
    assert_eq!(shop.activity_status, ShopActivityStatus::Pending);
    assert_eq!(shop.payment_status, ShopPaymentStatus::Unpaid);

    let membership = ChatParticipants::find()
        .filter(ParticipantCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?
        .expect("seller should have a support chat");
    let chat = Chats::find_by_id(membership.chat_id)
        .one(&state.orm)
        .await?
        .expect("chat row should exist");
    assert_eq!(chat.kind, ChatKind::SellerAdmin);

    let peers = ChatParticipants::find()
        .filter(ParticipantCol::ChatId.eq(chat.id))
        .all(&state.orm)
        .await?;
    assert_eq!(peers.len(), 2);
    assert!(peers.iter().any(|p| p.user_id == admin_id));

    // duplicate email is rejected
    let err = auth_service::register_user(&state, register_request(&email, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Email is already taken"));

    Ok(())
}

#[tokio::test]
async fn buyer_registration_has_no_side_effects_and_admin_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let email = format!("buyer-{}@example.com", Uuid::new_v4());
    let (_, resp) = auth_service::register_user(&state, register_request(&email, None)).await?;
    let user = resp.data.user;
    assert_eq!(user.role, UserRole::Buyer);

    let shop = Shops::find()
        .filter(ShopCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?;
    assert!(shop.is_none());

    let err = auth_service::register_user(
        &state,
        register_request(
            &format!("admin-{}@example.com", Uuid::new_v4()),
            Some(UserRole::Admin),
        ),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid role"));

    Ok(())
}
