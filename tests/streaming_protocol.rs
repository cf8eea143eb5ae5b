//! End-to-end tests of the streaming protocol.
//!
//! Spins up the axum application on an ephemeral port with scripted handlers
//! and drives it with the WebSocket client.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use focus_relay::adapters::ai::{MockChatModel, MockEmbeddings, ModelListing};
use focus_relay::adapters::client::{ChatSession, ClientError, StreamingClient};
use focus_relay::adapters::{app_router, AppState, WebSocketState};
use focus_relay::application::focus_handlers::ScriptedHandler;
use focus_relay::application::{HandlerRegistry, RequestRouter, StreamLimits};
use focus_relay::domain::client::ChatClient;
use focus_relay::domain::conversation::{ChatTurn, FocusMode, HandlerEvent, SourceRef};
use focus_relay::domain::protocol::{InboundRequest, OutboundFrame};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Relay {
    addr: SocketAddr,
    web: Arc<ScriptedHandler>,
    domain: Arc<ScriptedHandler>,
}

impl Relay {
    fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    async fn session(&self, mode: FocusMode) -> ChatSession {
        ChatSession::connect(&self.url(), ChatClient::new(mode)).await.unwrap()
    }

    async fn client(&self) -> StreamingClient {
        StreamingClient::connect(&self.url()).await.unwrap()
    }
}

fn weather_source() -> SourceRef {
    SourceRef::new("Weather today", "https://example.com/weather").with_snippet("Sunny and warm")
}

async fn start_relay() -> Relay {
    let web = Arc::new(ScriptedHandler::new(vec![
        HandlerEvent::Sources(vec![weather_source()]),
        HandlerEvent::token("It "),
        HandlerEvent::token("is sunny."),
    ]));
    let domain = Arc::new(ScriptedHandler::answer("Scoped answer."));

    let registry = HandlerRegistry::builder()
        .register(FocusMode::WebSearch, web.clone())
        .register(FocusMode::WebSearchDomain, domain.clone())
        .register(
            FocusMode::AcademicSearch,
            Arc::new(ScriptedHandler::failing("An error has occurred please try again later")),
        )
        .register(FocusMode::YoutubeSearch, Arc::new(ScriptedHandler::stalled()))
        .register(
            FocusMode::WritingAssistant,
            Arc::new(ScriptedHandler::answer("one two three four").with_delay(Duration::from_millis(20))),
        )
        .build();

    let router = RequestRouter::new(
        Arc::new(registry),
        Arc::new(MockChatModel::new()),
        Arc::new(MockEmbeddings::new()),
    )
    .with_limits(StreamLimits {
        request_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_millis(200),
    });

    let state = AppState::new(
        WebSocketState::new(router, 64),
        ModelListing {
            chat_models: Default::default(),
            embeddings: None,
        },
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app_router(state, &[]);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Relay { addr, web, domain }
}

async fn next(client: &mut StreamingClient) -> OutboundFrame {
    tokio::time::timeout(Duration::from_secs(5), client.next_frame())
        .await
        .expect("frame within timeout")
        .unwrap()
        .expect("connection open")
}

// =============================================================================
// Sunny path
// =============================================================================

#[tokio::test]
async fn answer_streams_with_sources_and_completes() {
    let relay = start_relay().await;
    let mut session = relay.session(FocusMode::WebSearch).await;

    let exchange = session.ask("What is the weather?").await.unwrap();

    assert_eq!(exchange.request_id.as_str(), "1");
    assert_eq!(exchange.answer, "It is sunny.");
    assert_eq!(exchange.sources, vec![weather_source()]);
    assert!(!session.state().is_loading());
    assert_eq!(
        session.state().history(),
        &[ChatTurn::human("What is the weather?"), ChatTurn::assistant("It is sunny.")]
    );
}

#[tokio::test]
async fn frames_arrive_in_protocol_order() {
    let relay = start_relay().await;
    let mut client = relay.client().await;

    client
        .send(&InboundRequest::new("weather", "webSearch", vec![]))
        .await
        .unwrap();

    let id = focus_relay::domain::foundation::RequestId::from("1");
    assert_eq!(next(&mut client).await, OutboundFrame::sources(id.clone(), vec![weather_source()]));
    assert_eq!(next(&mut client).await, OutboundFrame::delta(id.clone(), "It "));
    assert_eq!(next(&mut client).await, OutboundFrame::delta(id.clone(), "is sunny."));
    assert_eq!(next(&mut client).await, OutboundFrame::stream_end(id));
}

#[tokio::test]
async fn concurrent_requests_get_distinct_ids() {
    let relay = start_relay().await;
    let mut client = relay.client().await;

    let request = InboundRequest::new("draft", "writingAssistant", vec![]);
    client.send(&request).await.unwrap();
    client.send(&request).await.unwrap();

    let mut answers: HashMap<String, String> = HashMap::new();
    let mut ended = 0;
    while ended < 2 {
        match next(&mut client).await {
            OutboundFrame::MessageDelta { request_id, text } => {
                answers.entry(request_id.to_string()).or_default().push_str(&text);
            }
            OutboundFrame::StreamEnd { .. } => ended += 1,
            other => panic!("unexpected frame {other:?}"),
        }
    }

    assert_eq!(answers.len(), 2);
    assert_eq!(answers["1"], "one two three four");
    assert_eq!(answers["2"], "one two three four");
}

#[tokio::test]
async fn history_and_domain_reach_the_handler() {
    let relay = start_relay().await;
    let mut session = relay.session(FocusMode::WebSearchDomain).await;
    session.state_mut().set_domain(Some("docs.rs".to_string()));

    session.ask("first").await.unwrap();
    session.ask("second").await.unwrap();

    assert_eq!(relay.domain.queries(), vec!["first", "second"]);
    assert_eq!(relay.domain.history_lengths(), vec![1, 3]);
    assert_eq!(relay.domain.domains()[1].as_deref(), Some("docs.rs"));
}

#[tokio::test]
async fn rewrite_resubmits_the_prompt() {
    let relay = start_relay().await;
    let mut session = relay.session(FocusMode::WebSearch).await;

    session.ask("first").await.unwrap();
    let second = session.ask("second").await.unwrap();
    let entry_id = session.state().transcript().last().unwrap().id().clone();

    let rewritten = session.rewrite(&entry_id).await.unwrap();

    assert_ne!(rewritten.request_id, second.request_id);
    assert_eq!(relay.web.queries(), vec!["first", "second", "second"]);
    // Clients send the question as the last history turn.
    assert_eq!(relay.web.history_lengths(), vec![1, 3, 3]);
    assert_eq!(session.state().history().len(), 4);
}

// =============================================================================
// Rejected frames
// =============================================================================

#[tokio::test]
async fn unknown_focus_mode_is_a_connection_error() {
    let relay = start_relay().await;
    let mut client = relay.client().await;

    client
        .send(&InboundRequest::new("q", "imageSearch", vec![]))
        .await
        .unwrap();

    assert_eq!(
        next(&mut client).await,
        OutboundFrame::connection_error("Invalid focus mode")
    );
}

#[tokio::test]
async fn malformed_frame_keeps_the_connection_usable() {
    let relay = start_relay().await;
    let mut client = relay.client().await;

    client.send_raw("this is not json").await.unwrap();
    assert_eq!(
        next(&mut client).await,
        OutboundFrame::connection_error("Invalid message format")
    );

    client
        .send(&InboundRequest::new("weather", "webSearch", vec![]))
        .await
        .unwrap();
    // Rejected frames do not consume request ids.
    assert_eq!(next(&mut client).await.request_id().map(|id| id.as_str()), Some("1"));
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let relay = start_relay().await;
    let mut client = relay.client().await;

    client
        .send(&InboundRequest::new("   ", "webSearch", vec![]))
        .await
        .unwrap();

    assert_eq!(
        next(&mut client).await,
        OutboundFrame::connection_error("Invalid message format")
    );
    assert_eq!(relay.web.invocations(), 0);
}

#[tokio::test]
async fn domain_mode_without_domain_is_rejected() {
    let relay = start_relay().await;
    let mut session = relay.session(FocusMode::WebSearchDomain).await;

    let err = session.ask("tokio select").await.unwrap_err();

    assert!(matches!(err, ClientError::Rejected(ref m) if m == "Invalid message format"));
    assert!(!session.state().is_loading());
    assert_eq!(relay.domain.invocations(), 0);
}

// =============================================================================
// Failing handlers
// =============================================================================

#[tokio::test]
async fn handler_error_fails_only_that_request() {
    let relay = start_relay().await;
    let mut session = relay.session(FocusMode::AcademicSearch).await;

    let err = session.ask("attention").await.unwrap_err();
    match err {
        ClientError::RequestFailed { request_id, message } => {
            assert_eq!(request_id.as_str(), "1");
            assert_eq!(message, "An error has occurred please try again later");
        }
        other => panic!("unexpected error {other:?}"),
    }

    session.state_mut().set_focus_mode(FocusMode::WebSearch);
    let exchange = session.ask("weather").await.unwrap();
    assert_eq!(exchange.request_id.as_str(), "2");
}

#[tokio::test]
async fn stalled_handler_times_out() {
    let relay = start_relay().await;
    let mut session = relay.session(FocusMode::YoutubeSearch).await;

    let err = session.ask("rust talks").await.unwrap_err();

    assert!(matches!(err, ClientError::RequestFailed { ref message, .. } if message == "Request timed out"));
}

// =============================================================================
// Transport failures
// =============================================================================

/// Server that answers its first request with `first_reply`, then streams
/// `ok` for request id "2". With `first_reply` unset it hangs up instead.
async fn start_faulty_server(first_reply: Option<&'static str>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut answered = 0;
        while let Some(Ok(message)) = socket.next().await {
            if !message.is_text() {
                continue;
            }
            answered += 1;
            if answered == 1 {
                match first_reply {
                    Some(reply) => socket.send(Message::Text(reply.into())).await.unwrap(),
                    None => return,
                }
                continue;
            }
            for frame in [
                r#"{"type":"message","data":"ok","messageId":"2"}"#,
                r#"{"type":"messageEnd","messageId":"2"}"#,
            ] {
                socket.send(Message::Text(frame.into())).await.unwrap();
            }
        }
    });
    format!("ws://{addr}")
}

#[tokio::test]
async fn undecodable_frame_does_not_leave_the_session_busy() {
    let url = start_faulty_server(Some(r#"{"type":"suggestions","data":[]}"#)).await;
    let mut session = ChatSession::connect(&url, ChatClient::default()).await.unwrap();

    let err = session.ask("first").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidFrame(_)), "got {err:?}");
    assert!(!session.state().is_loading());

    let exchange = session.ask("second").await.unwrap();
    assert_eq!(exchange.answer, "ok");
    let texts: Vec<_> = session.state().transcript().iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec!["first", "second", "ok"]);
}

#[tokio::test]
async fn server_hang_up_clears_the_pending_request() {
    let url = start_faulty_server(None).await;
    let mut session = ChatSession::connect(&url, ChatClient::default()).await.unwrap();

    let err = session.ask("first").await.unwrap_err();
    assert!(
        matches!(err, ClientError::Disconnected | ClientError::WebSocket(_)),
        "got {err:?}"
    );
    assert!(!session.state().is_loading());

    let err = session.ask("second").await.unwrap_err();
    assert!(!matches!(err, ClientError::Busy), "got {err:?}");
    assert!(!session.state().is_loading());
}

#[tokio::test]
async fn conversation_continues_across_reconnects() {
    let relay = start_relay().await;
    let mut session = relay.session(FocusMode::WebSearch).await;
    let first = session.ask("weather").await.unwrap();

    // The new connection numbers its requests from "1" again.
    let state = session.state().clone();
    session.close().await.unwrap();
    let mut session = ChatSession::connect(&relay.url(), state).await.unwrap();
    let second = session.ask("and tomorrow?").await.unwrap();

    assert_eq!(first.request_id, second.request_id);
    let transcript = session.state().transcript();
    let texts: Vec<_> = transcript.iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec!["weather", "It is sunny.", "and tomorrow?", "It is sunny."]);
    assert_ne!(transcript[1].id(), transcript[3].id());
    assert_eq!(second.sources, vec![weather_source()]);
    assert_eq!(session.state().history().len(), 4);
}
