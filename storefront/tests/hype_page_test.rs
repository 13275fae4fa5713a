//! Hype text provider against a mock Gemini server, and the event page that
//! hosts it.

#![allow(clippy::unwrap_used)]

use horizon_genai::GeminiClient;
use horizon_storefront::config::GenAiConfig;
use horizon_storefront::hype::HypeFuture;
use horizon_storefront::page::LOADING_DESCRIPTION;
use horizon_storefront::{
    Catalog, EventPage, FlowError, GenAiHypeProvider, HypeSlot, HypeSource, HypeText,
    HypeTextProvider, PurchaseEnvironment, PurchaseStage, SimulatedPaymentProcessor,
};
use horizon_testing::test_clock;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn provider_for(server: &MockServer) -> GenAiHypeProvider {
    GenAiHypeProvider::new(GeminiClient::new("test-key".to_string()).with_base_url(server.uri()))
}

fn purchase_env() -> PurchaseEnvironment {
    PurchaseEnvironment::new(
        Arc::new(test_clock()),
        SimulatedPaymentProcessor::shared(Duration::from_millis(2000)),
        Duration::from_secs(10),
    )
}

/// Answers after a delay, and records whether it got that far
struct SlowProvider {
    delay: Duration,
    finished: Arc<AtomicBool>,
}

impl HypeTextProvider for SlowProvider {
    fn generate(&self, title: String, _fallback: String) -> HypeFuture {
        let delay = self.delay;
        let finished = Arc::clone(&self.finished);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            finished.store(true, Ordering::SeqCst);
            HypeText::remote(format!("{title}, reimagined in light."))
        })
    }
}

#[tokio::test]
async fn remote_text_is_used_when_the_model_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("Neon Symphony 2025"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Light floods the dome."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = provider_for(&server)
        .generate("Neon Symphony 2025".to_string(), "static".to_string())
        .await;

    assert_eq!(text, HypeText::remote("Light floods the dome."));
}

#[tokio::test]
async fn http_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let text = provider_for(&server)
        .generate("Retro Wave Night".to_string(), "80s nostalgia.".to_string())
        .await;

    assert_eq!(text.source, HypeSource::Fallback);
    assert_eq!(text.text, "80s nostalgia.");
}

#[tokio::test]
async fn empty_answer_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": ""}]}}]
        })))
        .mount(&server)
        .await;

    let text = provider_for(&server)
        .generate("Floating Art Gala".to_string(), "Clouds.".to_string())
        .await;

    assert_eq!(text, HypeText::fallback("Clouds."));
}

#[tokio::test]
async fn configured_provider_reaches_the_configured_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/custom-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Configured."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = GenAiConfig {
        api_key: Some("k".to_string()),
        model: "custom-model".to_string(),
        api_url: server.uri(),
        timeout: Duration::from_secs(2),
    };
    let provider = GenAiHypeProvider::from_config(&config);
    assert!(provider.is_enabled());

    let text = provider.generate("t".to_string(), "f".to_string()).await;
    assert!(text.is_remote());
}

#[tokio::test]
async fn event_page_shows_placeholder_then_remote_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "candidates": [{"content": {"parts": [{"text": "Sound becomes light."}]}}]
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let mut page = EventPage::open(
        &Catalog::reference(),
        "1",
        purchase_env(),
        Arc::new(provider_for(&server)),
    )
    .unwrap();

    assert_eq!(page.hype(), HypeSlot::Loading);
    assert_eq!(page.hype().text(), LOADING_DESCRIPTION);

    let settled = page.hype_settled().await.unwrap();
    assert_eq!(settled, HypeText::remote("Sound becomes light."));
    assert_eq!(page.hype().text(), "Sound becomes light.");
    assert_eq!(page.flow().stage().await, PurchaseStage::Selecting);
}

#[tokio::test]
async fn event_page_without_key_shows_static_description() {
    let provider = GenAiHypeProvider::shared(&GenAiConfig::default());
    let mut page =
        EventPage::open(&Catalog::reference(), "4", purchase_env(), provider).unwrap();

    let settled = page.hype_settled().await.unwrap();
    assert_eq!(settled, HypeText::fallback("80s nostalgia meets modern beat drops."));
}

#[tokio::test]
async fn unknown_event_is_rejected() {
    let err = EventPage::open(
        &Catalog::reference(),
        "404",
        purchase_env(),
        GenAiHypeProvider::shared(&GenAiConfig::default()),
    )
    .unwrap_err();
    assert_eq!(err, FlowError::UnknownEvent("404".to_string()));
}

#[tokio::test(start_paused = true)]
async fn closing_the_page_stops_hype_and_payment() {
    let finished = Arc::new(AtomicBool::new(false));
    let provider = Arc::new(SlowProvider {
        delay: Duration::from_secs(5),
        finished: Arc::clone(&finished),
    });

    let page = EventPage::open(&Catalog::reference(), "2", purchase_env(), provider).unwrap();
    let mut outcomes = page.flow().subscribe();
    page.flow().submit().await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    page.close();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!finished.load(Ordering::SeqCst));
    assert!(outcomes.try_recv().is_err());
}
