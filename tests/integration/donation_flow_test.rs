// Integration tests for the complete donation flow
//
// Spawns a real HTTP stub server that plays both the donation backend and
// the gateway checkout endpoint, then drives DonationFlowClient end-to-end:
// create donation -> fetch payment page -> extract embedded config ->
// submit to gateway -> classify.

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use actix_web::{web, App, HttpResponse};
use serde_json::json;

use onepay_harness::config::{GatewayConfig, HarnessConfig};
use onepay_harness::core::{AmountRule, Currency};
use onepay_harness::flow::{DonationFlowClient, FlowOutcome};
use onepay_harness::payment::DonationRequest;
use onepay_harness::signing::{HashSigner, TokenScheme};

const APP_ID: &str = "26DT119089BDB84D5FF8C";
const APP_SECRET: &str = "test-secret-key";

#[derive(Clone, Copy, PartialEq)]
enum GatewayMode {
    Redirect,
    Reject405,
    Error500,
}

struct StubState {
    token_scheme: TokenScheme,
    gateway_mode: GatewayMode,
    refuse_donations: bool,
    omit_marker: bool,
    counter: AtomicU64,
    donations: Mutex<HashMap<String, i64>>,
}

impl StubState {
    fn new(gateway_mode: GatewayMode) -> Self {
        Self {
            token_scheme: TokenScheme::Sha256,
            gateway_mode,
            refuse_donations: false,
            omit_marker: false,
            counter: AtomicU64::new(0),
            donations: Mutex::new(HashMap::new()),
        }
    }
}

async fn create_donation(
    state: web::Data<StubState>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    if state.refuse_donations {
        return HttpResponse::Ok().json(json!({
            "success": false,
            "message": "donations are disabled on this deployment"
        }));
    }
    let amount = body["amount"].as_i64().unwrap_or(0);
    let n = state.counter.fetch_add(1, Ordering::SeqCst) + 1;
    let reference = format!("REF{:09}", n);
    state
        .donations
        .lock()
        .unwrap()
        .insert(reference.clone(), amount);

    HttpResponse::Ok().json(json!({
        "success": true,
        "donation": {"id": n, "amount": amount, "currency": body["currency"]},
        "paymentUrl": format!("/pay/{}", reference)
    }))
}

async fn payment_page(state: web::Data<StubState>, path: web::Path<String>) -> HttpResponse {
    let reference = path.into_inner();
    let amount_minor = match state.donations.lock().unwrap().get(&reference) {
        Some(amount) => *amount,
        None => return HttpResponse::NotFound().finish(),
    };
    if state.omit_marker {
        return HttpResponse::Ok()
            .content_type("text/html")
            .body("<!doctype html><html><body>payment page without config</body></html>");
    }

    let amount = amount_minor / 100;
    let signer = HashSigner::new(APP_ID, APP_SECRET, state.token_scheme);
    let hash_token = signer.hash_token(amount, &reference).unwrap();
    let apptoken = signer.app_token(&hash_token).unwrap();
    let config = json!({
        "appid": APP_ID,
        "amount": amount,
        "orderReference": reference,
        "hashToken": hash_token,
        "apptoken": apptoken,
        "customerEmail": "donor@example.com",
        "transactionRedirectUrl": "http://127.0.0.1/donation-success"
    });

    HttpResponse::Ok().content_type("text/html").body(format!(
        "<!doctype html><html><body>\n<script>\nwindow.onePayData = {};\n</script>\n</body></html>",
        config
    ))
}

async fn donation_status(state: web::Data<StubState>, path: web::Path<String>) -> HttpResponse {
    let reference = path.into_inner();
    match state.donations.lock().unwrap().get(&reference) {
        Some(amount) => HttpResponse::Ok().json(json!({
            "success": true,
            "donation": {"id": reference, "status": "pending", "amount": amount}
        })),
        None => HttpResponse::NotFound().json(json!({"success": false})),
    }
}

async fn checkout(
    state: web::Data<StubState>,
    form: web::Form<Vec<(String, String)>>,
) -> HttpResponse {
    // A submission missing any required field is a broken payload, not a
    // gateway decision
    let fields: HashMap<&str, &str> = form
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    for required in ["appid", "amount", "orderReference", "hashToken", "apptoken"] {
        if !fields.contains_key(required) {
            return HttpResponse::BadRequest().body(format!("missing field {}", required));
        }
    }

    match state.gateway_mode {
        GatewayMode::Redirect => HttpResponse::Found()
            .insert_header(("Location", "https://gateway.example/session/abc123"))
            .finish(),
        GatewayMode::Reject405 => HttpResponse::MethodNotAllowed().finish(),
        GatewayMode::Error500 => HttpResponse::InternalServerError().finish(),
    }
}

fn spawn_stub(state: StubState) -> actix_test::TestServer {
    let state = web::Data::new(state);
    actix_test::start(move || {
        App::new()
            .app_data(state.clone())
            .route("/api/donations/create", web::post().to(create_donation))
            .route("/pay/{reference}", web::get().to(payment_page))
            .route(
                "/api/donations/status/{reference}",
                web::get().to(donation_status),
            )
            .route("/checkout", web::post().to(checkout))
    })
}

fn harness_config(srv: &actix_test::TestServer, token_scheme: TokenScheme) -> HarnessConfig {
    let base_url = format!("http://{}", srv.addr());
    HarnessConfig {
        gateway: GatewayConfig {
            app_id: APP_ID.to_string(),
            app_secret: APP_SECRET.to_string(),
            checkout_url: format!("{}/checkout", base_url),
            redirect_url: format!("{}/donation-success", base_url),
            token_scheme,
            amount_rule: AmountRule::MinorToMajor,
        },
        base_url,
        timeout_ms: 5_000,
        concurrency: 5,
    }
}

/// Port that nothing is listening on
fn closed_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to any available port")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

fn donation(amount_minor: i64) -> DonationRequest {
    let mut request = DonationRequest::new(amount_minor, Currency::LKR);
    request.donor_name = Some("Flow Tester".to_string());
    request.donor_email = Some("a@b.com".to_string());
    request
}

#[actix_web::test]
async fn test_accepted_flow_end_to_end() {
    let srv = spawn_stub(StubState::new(GatewayMode::Redirect));
    let client = DonationFlowClient::new(harness_config(&srv, TokenScheme::Sha256)).unwrap();

    let report = client.run(&donation(1500), None, true).await;

    assert_eq!(report.outcome, FlowOutcome::Accepted);
    assert_eq!(report.observed_status, Some(302));
    assert_eq!(report.backend_status.as_deref(), Some("pending"));

    // The reference issued by the stub is a 12-character token
    let reference = report.reference.as_deref().unwrap();
    assert_eq!(reference.len(), 12);
    assert!(reference.starts_with("REF"));

    for check in [
        "backend_accepted",
        "payment_page_ok",
        "config_extracted",
        "reference_matches",
        "appid_matches",
        "hash_scheme_ok",
        "amount_matches",
        "hash_matches",
        "app_token_format",
        "gateway_reached",
    ] {
        assert_eq!(
            report.checks.get(check),
            Some(&true),
            "check {} did not pass: {:?}",
            check,
            report.checks
        );
    }
}

#[actix_web::test]
async fn test_gateway_405_is_classified_not_raised() {
    let srv = spawn_stub(StubState::new(GatewayMode::Reject405));
    let client = DonationFlowClient::new(harness_config(&srv, TokenScheme::Sha256)).unwrap();

    let report = client.run(&donation(1500), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::Rejected405);
    assert_eq!(report.observed_status, Some(405));
    assert!(report.detail.is_none());
}

#[actix_web::test]
async fn test_gateway_500_is_rejected_other() {
    let srv = spawn_stub(StubState::new(GatewayMode::Error500));
    let client = DonationFlowClient::new(harness_config(&srv, TokenScheme::Sha256)).unwrap();

    let report = client.run(&donation(1500), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::RejectedOther);
    assert_eq!(report.observed_status, Some(500));
}

#[actix_web::test]
async fn test_unreachable_gateway_is_network_failed() {
    let srv = spawn_stub(StubState::new(GatewayMode::Redirect));
    let mut config = harness_config(&srv, TokenScheme::Sha256);
    config.gateway.checkout_url = format!("http://127.0.0.1:{}/checkout", closed_port());
    let client = DonationFlowClient::new(config).unwrap();

    let report = client.run(&donation(1500), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::NetworkFailed);
    assert!(report.observed_status.is_none());
    // The flow got as far as extraction before the network failure
    assert_eq!(report.checks.get("config_extracted"), Some(&true));
}

#[actix_web::test]
async fn test_unreachable_backend_is_network_failed() {
    let config = HarnessConfig {
        gateway: GatewayConfig {
            app_id: APP_ID.to_string(),
            app_secret: APP_SECRET.to_string(),
            checkout_url: "http://127.0.0.1:1/checkout".to_string(),
            redirect_url: "http://127.0.0.1:1/donation-success".to_string(),
            token_scheme: TokenScheme::Sha256,
            amount_rule: AmountRule::MinorToMajor,
        },
        base_url: format!("http://127.0.0.1:{}", closed_port()),
        timeout_ms: 2_000,
        concurrency: 1,
    };
    let client = DonationFlowClient::new(config).unwrap();

    let report = client.run(&donation(1500), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::NetworkFailed);
    assert!(report.reference.is_none());
}

#[actix_web::test]
async fn test_backend_refusal_halts_flow() {
    let mut state = StubState::new(GatewayMode::Redirect);
    state.refuse_donations = true;
    let srv = spawn_stub(state);
    let client = DonationFlowClient::new(harness_config(&srv, TokenScheme::Sha256)).unwrap();

    let report = client.run(&donation(1500), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::BackendError);
    assert!(report
        .detail
        .as_deref()
        .unwrap()
        .contains("donations are disabled"));
    assert!(report.checks.get("gateway_reached").is_none());
}

#[actix_web::test]
async fn test_missing_marker_is_extraction_error() {
    let mut state = StubState::new(GatewayMode::Redirect);
    state.omit_marker = true;
    let srv = spawn_stub(state);
    let client = DonationFlowClient::new(harness_config(&srv, TokenScheme::Sha256)).unwrap();

    let report = client.run(&donation(1500), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::ExtractionError);
    assert_eq!(report.checks.get("payment_page_ok"), Some(&true));
    assert!(report.checks.get("config_extracted").is_none());
}

#[actix_web::test]
async fn test_token_scheme_drift_is_flagged() {
    // Backend emits legacy 32-char tokens while the harness expects the
    // full 64-char scheme
    let mut state = StubState::new(GatewayMode::Redirect);
    state.token_scheme = TokenScheme::Legacy32;
    let srv = spawn_stub(state);
    let client = DonationFlowClient::new(harness_config(&srv, TokenScheme::Sha256)).unwrap();

    let report = client.run(&donation(1500), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::ContractDrift);
    assert!(report.detail.as_deref().unwrap().contains("32"));
}

#[actix_web::test]
async fn test_validation_stops_before_any_request() {
    let srv = spawn_stub(StubState::new(GatewayMode::Redirect));
    let client = DonationFlowClient::new(harness_config(&srv, TokenScheme::Sha256)).unwrap();

    let report = client.run(&donation(0), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::ValidationError);
    assert!(report.checks.is_empty());
    assert!(report.reference.is_none());
}

#[actix_web::test]
async fn test_extracted_payload_matches_conversion_rule() {
    // 1500 minor LKR must surface as 15 whole units in the embedded
    // payload under minor-to-major conversion
    let srv = spawn_stub(StubState::new(GatewayMode::Redirect));
    let client = DonationFlowClient::new(harness_config(&srv, TokenScheme::Sha256)).unwrap();

    let report = client.run(&donation(1500), None, false).await;
    assert_eq!(report.outcome, FlowOutcome::Accepted);
    assert_eq!(report.checks.get("amount_matches"), Some(&true));
    assert_eq!(report.checks.get("reference_matches"), Some(&true));
    assert_eq!(report.checks.get("hash_matches"), Some(&true));
}
