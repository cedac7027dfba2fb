use std::path::Path;
use std::sync::Arc;

use fcp_discord_login::{
    DiscordLoginModule, FixedCallbackUrl, LoginError, LoginMethod, RedirectSource,
};
use serde_json::json;
use tempfile::TempDir;

fn write_json(path: &Path, value: &serde_json::Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn module_dir(config: &serde_json::Value) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        &dir.path().join("module.json"),
        &json!({
            "name": "Discord OAuth2",
            "identifier": "discordOAuth2",
            "version": "1.2.0"
        }),
    );
    write_json(&dir.path().join("config").join("config.json"), config);
    write_json(
        &dir.path().join("messages").join("en.json"),
        &json!({ "button": "Sign in with Discord" }),
    );
    dir
}

fn valid_config() -> serde_json::Value {
    json!({
        "enabled": true,
        "shortName": "discord",
        "public": "client-123",
        "secret": "client-secret",
        "bot_token": "bot-token",
        "guild_id": "111",
        "customer_role": 222
    })
}

#[test]
fn loads_module_from_directory() {
    let dir = module_dir(&valid_config());

    let module = DiscordLoginModule::from_dir(
        dir.path(),
        &RedirectSource::BaseUrl("https://panel.example".into()),
    )
    .unwrap();

    assert!(module.start_module());
    assert_eq!(module.name(), "Discord OAuth2");
    assert_eq!(module.identifier(), "discordOAuth2");
    assert_eq!(module.module_info().version.as_deref(), Some("1.2.0"));
    assert_eq!(module.redirect_uri(), "https://panel.example/auth/r/discordOAuth2");
    assert_eq!(module.config().guild_id.get(), 111);
}

#[test]
fn messages_present_and_absent() {
    let dir = module_dir(&valid_config());
    let module = DiscordLoginModule::from_dir(
        dir.path(),
        &RedirectSource::Service(Arc::new(FixedCallbackUrl("https://cb.example".into()))),
    )
    .unwrap();

    let en = module.messages("en").unwrap().unwrap();
    assert_eq!(en["button"], "Sign in with Discord");

    assert!(module.messages("xx").unwrap().is_none());
    assert!(module.messages("../config/config").unwrap().is_none());
}

#[test]
fn empty_secret_refuses_to_start() {
    let mut config = valid_config();
    config["secret"] = json!("");
    let dir = module_dir(&config);

    let err = DiscordLoginModule::from_dir(
        dir.path(),
        &RedirectSource::BaseUrl("https://panel.example".into()),
    )
    .unwrap_err();

    assert!(matches!(err, LoginError::Config(_)), "got {err:?}");
}

#[test]
fn missing_config_file_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        &dir.path().join("module.json"),
        &json!({ "name": "Discord", "identifier": "discordOAuth2" }),
    );

    let err = DiscordLoginModule::from_dir(
        dir.path(),
        &RedirectSource::BaseUrl("https://panel.example".into()),
    )
    .unwrap_err();

    assert_eq!(err.to_error_body().code, "config_error");
}
