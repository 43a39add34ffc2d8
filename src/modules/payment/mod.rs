pub mod builder;
pub mod models;

pub use builder::PaymentRequestBuilder;
pub use models::{
    CustomerInfo, DonationRecord, DonationRequest, DonationStatus, PaymentGatewayPayload,
};
