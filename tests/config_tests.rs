//! Tests for configuration loading.

use std::io::Write;

use tweetify::config::{Backend, ProxyStreamFormat, TweetifyConfig, DEFAULT_IMAGE_MODEL};
use tweetify::error::TweetifyError;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn config_file_is_parsed() {
    let file = write_config(
        r#"
        backend = "proxy"
        proxy_base_url = "http://localhost:3000"
        proxy_stream_format = "data-stream"
        timeout_secs = 30
        stream = false
        "#,
    );

    let config = TweetifyConfig::from_file(file.path()).unwrap();
    assert_eq!(config.backend, Backend::Proxy);
    assert_eq!(config.proxy_base_url.as_deref(), Some("http://localhost:3000"));
    assert_eq!(config.proxy_stream_format, ProxyStreamFormat::DataStream);
    assert_eq!(config.timeout_secs, 30);
    assert!(!config.stream);
    assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
    assert!(config.validate().is_ok());
}

#[test]
fn env_layer_overrides_file_values() {
    let file = write_config("completion_model = \"from-file\"\nimage_size = \"256x256\"\n");
    let mut config = TweetifyConfig::from_file(file.path()).unwrap();

    config
        .apply_env_from(|key| match key {
            "TWEETIFY_COMPLETION_MODEL" => Some("from-env".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.completion_model, "from-env");
    assert_eq!(config.image_size, "256x256");
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TweetifyConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, TweetifyError::Io(_)));
}

#[test]
fn malformed_file_is_config_file_error() {
    let file = write_config("backend = [not valid");
    let err = TweetifyConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, TweetifyError::ConfigFile(_)));
}

#[test]
fn unknown_backend_is_rejected() {
    let err = TweetifyConfig::from_toml_str("backend = \"carrier-pigeon\"").unwrap_err();
    assert!(matches!(err, TweetifyError::ConfigFile(_)));
}

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn explicit_path_wins_in_load() {
    let explicit = write_config("image_model = \"custom-image\"\n");
    let from_env = write_config("image_model = \"other-image\"\n");
    let from_env_path = from_env.path().to_string_lossy().into_owned();

    let config = TweetifyConfig::load_with(
        Some(explicit.path()),
        vars(&[("TWEETIFY_CONFIG", from_env_path.as_str())]),
    )
    .unwrap();
    assert_eq!(config.image_model, "custom-image");
}

#[test]
fn config_env_var_selects_file_and_env_overlays_it() {
    let file = write_config("image_model = \"custom-image\"\nimage_size = \"512x512\"\n");
    let path = file.path().to_string_lossy().into_owned();

    let config = TweetifyConfig::load_with(
        None,
        vars(&[
            ("TWEETIFY_CONFIG", path.as_str()),
            ("TWEETIFY_IMAGE_SIZE", "256x256"),
        ]),
    )
    .unwrap();
    assert_eq!(config.image_model, "custom-image");
    assert_eq!(config.image_size, "256x256");
}
