//! WebSocket transport for sessions.

use std::{future, net::SocketAddr};

use axum::{
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, Stream, StreamExt, TryStreamExt};
use present_session::Session;
use tracing::Instrument;
use uuid::Uuid;

use crate::router::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, remote, state))
}

async fn handle_socket(socket: WebSocket, remote: SocketAddr, state: AppState) {
    let conn = Uuid::new_v4();
    let span = tracing::info_span!("conn", %conn, %remote);
    async move {
        tracing::info!("Client connected");
        let (sink, stream) = socket.split();
        let reader = text_frames(stream).boxed();
        let writer = sink.with(|text: String| {
            future::ready(Ok::<_, axum::Error>(WsMessage::Text(text.into())))
        });

        match Session::new(state.orchestrator).run(reader, writer).await {
            Ok(()) => tracing::info!("Client disconnected"),
            Err(e) => tracing::warn!("Connection dropped: {e}"),
        }
    }
    .instrument(span)
    .await;
}

/// Text payloads of a WebSocket, ending at the first close frame.
///
/// Binary frames are accepted when they carry UTF-8; control frames are
/// skipped.
fn text_frames<S>(frames: S) -> impl Stream<Item = Result<String, axum::Error>>
where
    S: Stream<Item = Result<WsMessage, axum::Error>>,
{
    frames
        .try_take_while(|msg| future::ready(Ok(!matches!(msg, WsMessage::Close(_)))))
        .try_filter_map(|msg| {
            future::ready(Ok(match msg {
                WsMessage::Text(text) => Some(text.as_str().to_owned()),
                WsMessage::Binary(data) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => Some(text),
                    Err(_) => {
                        tracing::debug!("Dropping non-UTF-8 binary frame");
                        None
                    }
                },
                _ => None,
            }))
        })
}
