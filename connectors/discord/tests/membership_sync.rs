use fcp_discord_login::{
    DiscordLoginModule, ExternalAccount, LoginMethod, ModuleConfig, ModuleInfo, ModuleResources,
    RedirectSource,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROLE_PATH: &str = "/guilds/111/members/42/roles/222";

fn module_for(server: &MockServer) -> DiscordLoginModule {
    module_at(&server.uri())
}

fn module_at(api_url: &str) -> DiscordLoginModule {
    let config = json!({
        "enabled": true,
        "shortName": "discord",
        "public": "client-123",
        "secret": "client-secret",
        "bot_token": "Bot bot-token",
        "guild_id": 111,
        "customer_role": "222",
        "api_url": api_url,
        "timeout": 2
    });

    let info: ModuleInfo = serde_json::from_value(json!({
        "name": "Discord",
        "identifier": "discordOAuth2"
    }))
    .unwrap();

    DiscordLoginModule::new(
        ModuleConfig::from_json_str(&config.to_string()).unwrap(),
        info,
        ModuleResources::new("/nonexistent"),
        &RedirectSource::BaseUrl("https://panel.example".into()),
    )
    .unwrap()
}

fn account() -> ExternalAccount {
    ExternalAccount::new("local-7", "42")
}

#[tokio::test]
async fn connect_adds_role_with_bot_auth() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(ROLE_PATH))
        .and(header("authorization", "Bot bot-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = module_for(&server).on_connect(&account()).await;

    assert!(result.success);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn connect_twice_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(ROLE_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let module = module_for(&server);
    let first = module.on_connect(&account()).await;
    let second = module.on_connect(&account()).await;

    assert!(first.success);
    assert_eq!(first, second);
}

#[tokio::test]
async fn disconnect_removes_role() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(ROLE_PATH))
        .and(header("authorization", "Bot bot-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = module_for(&server).on_disconnect(&account()).await;

    assert!(result.success);
}

#[tokio::test]
async fn connect_rate_limited_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(ROLE_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "2")
                .set_body_json(json!({
                    "message": "You are being rate limited.",
                    "retry_after": 2.0,
                    "global": false
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = module_for(&server).on_connect(&account()).await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "rate_limited");
}

#[tokio::test]
async fn connect_rate_limited_with_unparsable_retry_after_reports_failure() {
    // The failure is logged with its retry delay, so log at full verbosity.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(ROLE_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "NaN"))
        .expect(1)
        .mount(&server)
        .await;

    let result = module_for(&server).on_connect(&account()).await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "rate_limited");
}

#[tokio::test]
async fn disconnect_missing_permissions_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(ROLE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Missing Permissions",
            "code": 50013
        })))
        .mount(&server)
        .await;

    let result = module_for(&server).on_disconnect(&account()).await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.code, "forbidden");
    assert!(error.message.contains("Missing Permissions"));
}

#[tokio::test]
async fn connect_unknown_member_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(ROLE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Unknown Member",
            "code": 10007
        })))
        .mount(&server)
        .await;

    let result = module_for(&server).on_connect(&account()).await;

    assert_eq!(result.error.unwrap().code, "not_found");
}

#[tokio::test]
async fn connect_with_non_numeric_id_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let result = module_for(&server)
        .on_connect(&ExternalAccount::new("local-7", "42abc"))
        .await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "validation_error");
}

#[tokio::test]
async fn connect_unreachable_provider_reports_failure() {
    // Nothing listens on the discard port.
    let module = module_at("http://127.0.0.1:9");

    let result = module.on_connect(&account()).await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "upstream_error");
}
