use dossier_browser::{BrowserEngine, LiveSession, ProfileSession, SessionMode};
use dossier_core::{AppConfig, Credentials};

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_browser_engine_launch() {
    let engine = BrowserEngine::launch(AppConfig::default().browser).await;
    assert!(engine.is_ok(), "Failed to launch browser engine");
    engine.unwrap().close().await;
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_open_page_and_content() {
    let engine = BrowserEngine::launch(AppConfig::default().browser)
        .await
        .unwrap();

    let page = engine.open_page("https://example.com").await.unwrap();
    let html = engine.page_content(&page).await.unwrap();
    assert!(html.contains("Example Domain"));

    engine.close().await;
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_anonymous_session_without_credentials() {
    let session = LiveSession::new(AppConfig::default(), Credentials::default());

    let mode = session.open().await;
    assert_eq!(mode, SessionMode::Anonymous { degraded: None });

    // Idempotent open returns the same mode without relaunching.
    let mode_again = session.open().await;
    assert_eq!(mode, mode_again);

    session.close().await;
    session.close().await;
}
