use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::core::{ErrorKind, HarnessError, Result};
use crate::modules::payment::{
    CustomerInfo, DonationRecord, DonationRequest, PaymentGatewayPayload, PaymentRequestBuilder,
};
use crate::modules::probe::{HttpProbe, ProbeRequest, ProbeResponse};

use super::extract::{extract_embedded_config, GatewayPageConfig};

/// Terminal classification of one donation-to-gateway round trip
///
/// The first three variants mean the pipeline reached the gateway and got an
/// answer; the rest record where the pipeline halted. A gateway rejection is
/// an expected, testable terminal state, never a thrown error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowOutcome {
    /// 301/302/303 with a Location header: the gateway accepted the payload
    Accepted,
    /// Method/endpoint-level refusal, distinct from a business decline
    #[serde(rename = "rejected-405")]
    Rejected405,
    /// Any other terminal gateway status
    RejectedOther,
    /// Connection failure or timeout at any step
    NetworkFailed,
    /// Backend returned success=false, a malformed response, or a bad page
    BackendError,
    /// Embedded gateway config missing or unparseable
    ExtractionError,
    /// Malformed input stopped the flow before any submission
    ValidationError,
    /// Observed token format disagrees with the configured scheme
    ContractDrift,
}

impl FlowOutcome {
    /// True when the flow completed to a gateway classification
    pub fn is_gateway_terminal(&self) -> bool {
        matches!(
            self,
            FlowOutcome::Accepted | FlowOutcome::Rejected405 | FlowOutcome::RejectedOther
        )
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowOutcome::Accepted => "accepted",
            FlowOutcome::Rejected405 => "rejected-405",
            FlowOutcome::RejectedOther => "rejected-other",
            FlowOutcome::NetworkFailed => "network-failed",
            FlowOutcome::BackendError => "backend-error",
            FlowOutcome::ExtractionError => "extraction-error",
            FlowOutcome::ValidationError => "validation-error",
            FlowOutcome::ContractDrift => "contract-drift",
        };
        write!(f, "{}", s)
    }
}

/// Everything observed during one flow run
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub outcome: FlowOutcome,
    /// Order reference parsed from the issued payment URL
    pub reference: Option<String>,
    /// Final gateway HTTP status, when the gateway was reached
    pub observed_status: Option<u16>,
    /// Per-contract-check verdicts, in stable order
    pub checks: BTreeMap<String, bool>,
    /// Backend's view of the donation after submission, when polled
    pub backend_status: Option<String>,
    /// Failure detail for halted flows
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

impl FlowReport {
    fn empty() -> Self {
        Self {
            outcome: FlowOutcome::ValidationError,
            reference: None,
            observed_status: None,
            checks: BTreeMap::new(),
            backend_status: None,
            detail: None,
            elapsed_ms: 0,
        }
    }

    fn check(&mut self, name: &str, passed: bool) {
        self.checks.insert(name.to_string(), passed);
    }
}

/// Classifies the gateway's terminal response
///
/// 301/302/303 with a `Location` header is acceptance; 405 is a
/// method/route-level refusal; anything else is some other rejection.
pub fn classify_gateway_response(response: &ProbeResponse) -> FlowOutcome {
    match response.status {
        301 | 302 | 303 if response.header("location").is_some() => FlowOutcome::Accepted,
        405 => FlowOutcome::Rejected405,
        _ => FlowOutcome::RejectedOther,
    }
}

fn outcome_for(error: &HarnessError) -> FlowOutcome {
    match error.kind() {
        ErrorKind::Validation | ErrorKind::Configuration | ErrorKind::Scenario => {
            FlowOutcome::ValidationError
        }
        ErrorKind::Network => FlowOutcome::NetworkFailed,
        ErrorKind::Backend => FlowOutcome::BackendError,
        ErrorKind::Extraction => FlowOutcome::ExtractionError,
        ErrorKind::ContractDrift => FlowOutcome::ContractDrift,
    }
}

/// Backend response to a donation-creation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDonationResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    donation: Option<DonationRecord>,
    #[serde(default)]
    payment_url: Option<String>,
}

/// Backend response to a donation-status request
#[derive(Debug, Deserialize)]
struct DonationStatusResponse {
    success: bool,
    #[serde(default)]
    donation: Option<serde_json::Value>,
}

/// Drives one complete donation → payment page → gateway round trip
///
/// Each run is independent end-to-end: no state is shared between flow
/// instances, so any number of them may run concurrently.
pub struct DonationFlowClient {
    config: HarnessConfig,
    probe: HttpProbe,
    builder: PaymentRequestBuilder,
}

impl DonationFlowClient {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let probe = HttpProbe::new(std::time::Duration::from_millis(config.timeout_ms))?;
        let builder = PaymentRequestBuilder::new(config.gateway.clone());
        Ok(Self {
            config,
            probe,
            builder,
        })
    }

    /// Runs the full flow and classifies the outcome
    ///
    /// Never returns an error: every step failure is caught, classified and
    /// recorded on the report.
    pub async fn run(
        &self,
        request: &DonationRequest,
        customer: Option<&CustomerInfo>,
        check_status: bool,
    ) -> FlowReport {
        let started = Instant::now();
        let mut report = FlowReport::empty();

        match self.execute(request, customer, check_status, &mut report).await {
            Ok(outcome) => report.outcome = outcome,
            Err(error) => {
                warn!(error = %error, "flow halted before gateway classification");
                report.outcome = outcome_for(&error);
                report.detail = Some(error.to_string());
            }
        }
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            outcome = %report.outcome,
            reference = report.reference.as_deref().unwrap_or("-"),
            status = report.observed_status.unwrap_or(0),
            elapsed_ms = report.elapsed_ms,
            "flow finished"
        );
        report
    }

    async fn execute(
        &self,
        request: &DonationRequest,
        customer: Option<&CustomerInfo>,
        check_status: bool,
        report: &mut FlowReport,
    ) -> Result<FlowOutcome> {
        request.validate()?;

        // Created -> DonationAccepted
        let (record, payment_url) = self.create_donation(request).await?;
        report.check("backend_accepted", true);

        let reference = reference_from_url(&payment_url)?;
        report.reference = Some(reference.clone());

        // DonationAccepted -> PageFetched
        let page = self.fetch_payment_page(&payment_url).await?;
        report.check("payment_page_ok", true);

        // PageFetched -> PayloadExtracted
        let embedded = extract_embedded_config(&page)?;
        report.check("config_extracted", true);

        let customer = match customer {
            Some(c) => c.clone(),
            None => CustomerInfo::for_donation(request),
        };
        self.verify_contract(&record, &reference, &embedded, &customer, report)?;

        // PayloadExtracted -> GatewaySubmitted
        let payload = self.payload_for_submission(&embedded, &customer)?;
        let response = self.submit_to_gateway(&payload).await?;
        report.observed_status = Some(response.status);
        report.check("gateway_reached", true);

        let outcome = classify_gateway_response(&response);
        debug!(
            status = response.status,
            location = response.header("location").unwrap_or("-"),
            outcome = %outcome,
            "gateway response classified"
        );

        if check_status {
            report.backend_status = self.donation_status(&reference).await.ok();
        }

        Ok(outcome)
    }

    /// POST the donation request to the backend and parse the issued record
    async fn create_donation(&self, request: &DonationRequest) -> Result<(DonationRecord, String)> {
        let url = format!("{}/api/donations/create", self.config.base_url.trim_end_matches('/'));
        let body = serde_json::to_value(request)?;
        let response = self.probe.send(&ProbeRequest::post_json(url, body)).await?;

        if !response.is_success() {
            return Err(HarnessError::backend(format!(
                "donation creation returned HTTP {}",
                response.status
            )));
        }

        let parsed: CreateDonationResponse = serde_json::from_str(&response.body)
            .map_err(|e| HarnessError::backend(format!("donation response is not valid JSON: {}", e)))?;

        if !parsed.success {
            return Err(HarnessError::backend(format!(
                "backend refused donation: {}",
                parsed.message.as_deref().unwrap_or("no message")
            )));
        }
        let payment_url = parsed.payment_url.ok_or_else(|| {
            HarnessError::backend("backend accepted donation but issued no payment URL")
        })?;

        let reference = reference_from_url(&payment_url)?;
        let record = match parsed.donation {
            Some(mut record) => {
                if record.payment_reference.is_none() {
                    record.payment_reference = Some(reference);
                }
                record
            }
            // Some backend builds omit the record; synthesize one so the
            // expected payload can still be computed
            None => DonationRecord {
                id: reference.clone(),
                amount_minor: request.amount_minor,
                currency: request.currency,
                created_at: None,
                payment_reference: Some(reference),
                status: Default::default(),
            },
        };

        Ok((record, payment_url))
    }

    /// GET the issued payment URL; anything but 200 is a backend failure
    async fn fetch_payment_page(&self, payment_url: &str) -> Result<String> {
        let url = self.resolve_url(payment_url);
        let response = self.probe.send(&ProbeRequest::get(url)).await?;
        if response.status != 200 {
            return Err(HarnessError::backend(format!(
                "payment page returned HTTP {}",
                response.status
            )));
        }
        Ok(response.body)
    }

    /// Compare the embedded config against an independently built payload
    ///
    /// The harness knows the shared secret, so the page's tokens must equal
    /// a fresh computation over the same fields. A token of the wrong shape
    /// halts the flow as contract drift; value mismatches are recorded as
    /// failed checks but still submitted, since the gateway's verdict on a
    /// bad hash is itself worth observing.
    fn verify_contract(
        &self,
        record: &DonationRecord,
        reference: &str,
        embedded: &GatewayPageConfig,
        customer: &CustomerInfo,
        report: &mut FlowReport,
    ) -> Result<()> {
        report.check("reference_matches", embedded.order_reference == reference);
        report.check("appid_matches", embedded.appid == self.config.gateway.app_id);

        self.builder.signer().verify_token(&embedded.hash_token)?;
        report.check("hash_scheme_ok", true);

        let expected = self.builder.build(record, customer)?;
        report.check("amount_matches", embedded.amount == expected.amount);
        report.check("hash_matches", embedded.hash_token == expected.hash_token);
        report.check(
            "app_token_format",
            embedded
                .apptoken
                .ends_with(&format!(".{}", self.config.gateway.app_id)),
        );
        Ok(())
    }

    /// Rebuild the form the payment page would auto-submit
    ///
    /// Token fields come from the page verbatim; customer fields fall back
    /// to the scenario's customer where the page omits them.
    fn payload_for_submission(
        &self,
        embedded: &GatewayPageConfig,
        customer: &CustomerInfo,
    ) -> Result<PaymentGatewayPayload> {
        Ok(PaymentGatewayPayload {
            appid: embedded.appid.clone(),
            amount: embedded.amount,
            order_reference: embedded.order_reference.clone(),
            customer_first_name: embedded
                .customer_first_name
                .clone()
                .unwrap_or_else(|| customer.first_name.clone()),
            customer_last_name: embedded
                .customer_last_name
                .clone()
                .unwrap_or_else(|| customer.last_name.clone()),
            customer_email: embedded
                .customer_email
                .clone()
                .unwrap_or_else(|| customer.email.clone()),
            customer_phone_number: embedded
                .customer_phone_number
                .clone()
                .unwrap_or_else(|| customer.phone_number.clone()),
            transaction_redirect_url: embedded
                .transaction_redirect_url
                .clone()
                .unwrap_or_else(|| self.config.gateway.redirect_url.clone()),
            additional_data: embedded
                .additional_data
                .clone()
                .unwrap_or_else(|| "harness_probe".to_string()),
            hash_token: embedded.hash_token.clone(),
            apptoken: embedded.apptoken.clone(),
        })
    }

    /// Submit the payload to the gateway with redirects disabled
    async fn submit_to_gateway(&self, payload: &PaymentGatewayPayload) -> Result<ProbeResponse> {
        let mut request =
            ProbeRequest::post_form(self.config.gateway.checkout_url.clone(), payload.to_form());
        request.headers.push((
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        ));
        self.probe.send(&request).await
    }

    /// Poll the backend for its view of the donation after submission
    async fn donation_status(&self, reference: &str) -> Result<String> {
        let url = format!(
            "{}/api/donations/status/{}",
            self.config.base_url.trim_end_matches('/'),
            reference
        );
        let response = self.probe.send(&ProbeRequest::get(url)).await?;
        if !response.is_success() {
            return Err(HarnessError::backend(format!(
                "status endpoint returned HTTP {}",
                response.status
            )));
        }
        let parsed: DonationStatusResponse = serde_json::from_str(&response.body)
            .map_err(|e| HarnessError::backend(format!("status response is not valid JSON: {}", e)))?;
        if !parsed.success {
            return Err(HarnessError::backend("status endpoint reported failure"));
        }
        let status = parsed
            .donation
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");
        Ok(status.to_string())
    }

    /// Backends issue absolute payment URLs; tolerate relative ones too
    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

/// The order reference is the last path segment of the issued payment URL
fn reference_from_url(payment_url: &str) -> Result<String> {
    let missing = || {
        HarnessError::backend(format!(
            "payment URL {:?} carries no order reference",
            payment_url
        ))
    };

    let without_scheme = payment_url
        .strip_prefix("https://")
        .or_else(|| payment_url.strip_prefix("http://"))
        .unwrap_or(payment_url);
    let (_, path) = without_scheme.split_once('/').ok_or_else(missing)?;

    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .ok_or_else(missing)
}
