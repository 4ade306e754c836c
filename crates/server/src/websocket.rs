//! WebSocket endpoint for a conversational voice session: a tagged
//! message envelope carrying either text or base64 audio in, and the
//! same answer envelope the REST endpoints return, over the same
//! answering pipeline.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bv_rag_core::InputMode;
use bv_rag_orchestrator::AnswerRequest;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::{to_http_response, HttpAnswerResponse};
use crate::metrics::record_websocket_connection;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Text { text: String },
    Audio { audio: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Response(Box<HttpAnswerResponse>),
    Error { message: String },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

async fn handle_socket(socket: WebSocket, session_id: Uuid, state: AppState) {
    record_websocket_connection(1);
    let (mut sender, mut receiver) = socket.split();

    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else {
            continue;
        };

        let client_msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                let _ = send(&mut sender, &ServerMessage::Error { message: format!("invalid message: {e}") }).await;
                continue;
            },
        };

        match client_msg {
            ClientMessage::Text { text } => {
                answer_and_send(&mut sender, &state, session_id, text, InputMode::Text, None).await;
            },
            ClientMessage::Audio { audio } => {
                let bytes = match BASE64.decode(&audio) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = send(&mut sender, &ServerMessage::Error { message: format!("invalid audio: {e}") }).await;
                        continue;
                    },
                };

                let transcript = match state.speech_to_text.transcribe(&bytes).await {
                    Ok(t) => t,
                    Err(e) => {
                        let _ =
                            send(&mut sender, &ServerMessage::Error { message: format!("transcription failed: {e}") })
                                .await;
                        continue;
                    },
                };

                answer_and_send(
                    &mut sender,
                    &state,
                    session_id,
                    transcript.clone(),
                    InputMode::Voice,
                    Some(transcript),
                )
                .await;
            },
        }
    }

    record_websocket_connection(-1);
}

async fn answer_and_send(
    sender: &mut SplitSink<WebSocket, Message>,
    state: &AppState,
    session_id: Uuid,
    query: String,
    input_mode: InputMode,
    transcription: Option<String>,
) {
    let req = AnswerRequest { session_id, user_id: None, query, input_mode };

    let response = match state.pipeline.answer(req, tokio_util::sync::CancellationToken::new()).await {
        Ok(r) => r,
        Err(e) => {
            let _ = send(sender, &ServerMessage::Error { message: e.to_string() }).await;
            return;
        },
    };

    let envelope = to_http_response(response, input_mode, transcription);
    let _ = send(sender, &ServerMessage::Response(Box::new(envelope))).await;
}

async fn send(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> Result<(), ()> {
    let text = serde_json::to_string(msg).map_err(|_| ())?;
    sender.send(Message::Text(text)).await.map_err(|_| ())
}
