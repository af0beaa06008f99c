//! Backend selection, fallback and enterprise token handling against live
//! mock endpoints.

mod helpers;

use helpers::{ENTERPRISE_CHAT_PATH, TestHarness, openai_reply, session};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use sy_cli::session::Response;
use sy_llm::{DispatchOutcome, EnterpriseBackend, LlmConfig, LlmError};
use sy_protocol::{BackendChoice, ChatMessage};

#[tokio::test]
async fn planning_goes_to_enterprise_when_hosted_is_missing() {
    let h = TestHarness::start().await;
    h.ollama_online().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.ollama)
        .await;
    h.token_endpoint("tok-1", 3600, 1).await;
    h.enterprise_replies("1. Inventory callers\n2. Migrate\n3. Remove the shim")
        .await;

    let dispatcher = h.dispatcher(&h.local_and_enterprise_config()).await;
    assert!(dispatcher.is_available(BackendChoice::PrimaryLocal));
    assert!(dispatcher.is_available(BackendChoice::Enterprise));
    assert!(!dispatcher.is_available(BackendChoice::SecondaryHosted));

    let response = session(dispatcher)
        .respond("/chat plan the migration to async")
        .await;

    assert_eq!(
        response,
        Response::Text("1. Inventory callers\n2. Migrate\n3. Remove the shim".into())
    );
}

#[tokio::test]
async fn code_tasks_stay_local() {
    let h = TestHarness::start().await;
    h.ollama_online().await;
    h.ollama_replies("patched").await;
    h.token_endpoint("unused", 3600, 0).await;

    let dispatcher = h.dispatcher(&h.full_config()).await;
    let outcome = dispatcher
        .dispatch(&[ChatMessage::user("fix the off-by-one in the pager")])
        .await;

    assert_eq!(
        outcome,
        DispatchOutcome::Answered {
            backend: BackendChoice::PrimaryLocal,
            text: "patched".into(),
            attempts: 1,
        }
    );
}

#[tokio::test]
async fn failed_local_backend_falls_back_to_hosted() {
    let h = TestHarness::start().await;
    h.ollama_online().await;
    h.ollama_fails(500).await;
    h.hosted_replies("answer from hosted").await;

    let config = LlmConfig {
        ollama: h.ollama_config(),
        hosted: h.hosted_config(),
        ..Default::default()
    };
    let dispatcher = h.dispatcher(&config).await;
    let outcome = dispatcher
        .dispatch(&[ChatMessage::user("debug this stack trace")])
        .await;

    assert_eq!(
        outcome,
        DispatchOutcome::Answered {
            backend: BackendChoice::SecondaryHosted,
            text: "answer from hosted".into(),
            attempts: 2,
        }
    );
}

#[tokio::test]
async fn exhausted_backends_produce_a_diagnostic_reply() {
    let h = TestHarness::start().await;
    h.ollama_online().await;
    h.ollama_fails(500).await;
    Mock::given(method("POST"))
        .and(path(helpers::HOSTED_CHAT_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&h.hosted)
        .await;

    let config = LlmConfig {
        ollama: h.ollama_config(),
        hosted: h.hosted_config(),
        ..Default::default()
    };
    let dispatcher = h.dispatcher(&config).await;

    let Response::Text(text) = session(dispatcher).respond("/chat hello there").await else {
        panic!("expected text");
    };

    assert!(text.starts_with("All language-model backends failed."), "{text}");
    assert!(text.contains("ollama:"));
    assert!(text.contains("openai:"));
    assert!(text.contains("enterprise: not configured or unreachable"));
}

#[tokio::test]
async fn enterprise_refreshes_token_after_401() {
    let h = TestHarness::start().await;
    h.token_endpoint("tok", 3600, 2).await;
    // First call is rejected once; the retry with a fresh token succeeds.
    Mock::given(method("POST"))
        .and(path(ENTERPRISE_CHAT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&h.enterprise)
        .await;
    Mock::given(method("POST"))
        .and(path(ENTERPRISE_CHAT_PATH))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("refreshed")))
        .expect(1)
        .mount(&h.enterprise)
        .await;

    let backend = EnterpriseBackend::new(h.enterprise_config()).unwrap();
    let reply = backend.test_connection().await.unwrap();

    assert_eq!(reply, "refreshed");
}

#[tokio::test]
async fn enterprise_gives_up_after_second_401() {
    let h = TestHarness::start().await;
    h.token_endpoint("tok", 3600, 2).await;
    Mock::given(method("POST"))
        .and(path(ENTERPRISE_CHAT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&h.enterprise)
        .await;

    let backend = EnterpriseBackend::new(h.enterprise_config()).unwrap();
    let err = backend.test_connection().await.unwrap_err();

    assert!(matches!(err, LlmError::Authentication(_)), "{err:?}");
}

#[tokio::test]
async fn enterprise_token_is_reused_across_calls() {
    let h = TestHarness::start().await;
    h.token_endpoint("tok", 3600, 1).await;
    h.enterprise_replies("ok").await;

    let dispatcher = h.dispatcher(&h.enterprise_only_config()).await;
    for _ in 0..3 {
        let text = dispatcher
            .chat(&[ChatMessage::user("explain the retry loop")])
            .await;
        assert_eq!(text, "ok");
    }
}
