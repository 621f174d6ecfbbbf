use karaoke_studio_lib::config::AppConfig;
use karaoke_studio_lib::serve;
use karaoke_studio_lib::utils::AppError;

fn memory_config(bind_addr: &str) -> AppConfig {
    let config = AppConfig::from_toml_str(&format!(
        r#"
        [server]
        bind_addr = "{}"

        [storage]
        backend = "memory"
        public_base_url = "http://localhost/files"

        [media]
        ffmpeg_path = "/nonexistent/ffmpeg"
        "#,
        bind_addr
    ))
    .unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_serve_stops_on_shutdown() {
    // Shutdown resolves immediately, so serve returns once bound
    let result = serve(memory_config("127.0.0.1:0"), async {}).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_serve_reports_bind_failure() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();

    let err = serve(memory_config(&addr.to_string()), async {})
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Server(_)));
    assert_eq!(err.code(), "SERVER_ERROR");
}
