pub mod client;
pub mod extract;

pub use client::{classify_gateway_response, DonationFlowClient, FlowOutcome, FlowReport};
pub use extract::{extract_embedded_config, GatewayPageConfig, EMBEDDED_CONFIG_MARKER};
