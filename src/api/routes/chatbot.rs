use crate::{
    api::{
        AppState,
        extract::{AuthUser, Payload},
    },
    core::chatbot::{self, AskPayload},
    entities::ChatModel,
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};

/// `POST /chatbot/chat/`: answers a question and records the exchange.
pub async fn ask(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<AskPayload>,
) -> Result<(StatusCode, Json<ChatModel>)> {
    let question = payload.validate()?;
    let chat = chatbot::ask(
        &state.db,
        user.id,
        &state.corpus,
        state.config.chatbot.min_score,
        question,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// `GET /chatbot/chat/history/`: the caller's exchanges, newest first.
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ChatModel>>> {
    Ok(Json(chatbot::history(&state.db, user.id).await?))
}
