// Property-based tests for gateway payload construction
//
// Validates:
// - Name truncation to 50 characters never fails solely due to length
// - Reference round-trip: the payload's orderReference equals the
//   reference the record carries
// - Minor-to-major conversion happens exactly at payload construction

use proptest::prelude::*;

use onepay_harness::config::GatewayConfig;
use onepay_harness::core::{AmountRule, Currency};
use onepay_harness::payment::{CustomerInfo, DonationRecord, PaymentRequestBuilder};
use onepay_harness::signing::TokenScheme;

fn builder(rule: AmountRule) -> PaymentRequestBuilder {
    PaymentRequestBuilder::new(GatewayConfig {
        app_id: "26DT119089BDB84D5FF8C".to_string(),
        app_secret: "test-secret-key".to_string(),
        checkout_url: "https://ipg.onepay.lk/ipg/checkout/".to_string(),
        redirect_url: "https://example.org/donation-success".to_string(),
        token_scheme: TokenScheme::Sha256,
        amount_rule: rule,
    })
}

fn record(amount_minor: i64, reference: &str) -> DonationRecord {
    DonationRecord {
        id: "1".to_string(),
        amount_minor,
        currency: Currency::LKR,
        created_at: None,
        payment_reference: Some(reference.to_string()),
        status: Default::default(),
    }
}

fn customer(first: String, last: String) -> CustomerInfo {
    CustomerInfo {
        first_name: first,
        last_name: last,
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn test_names_never_exceed_fifty_chars(
        first in ".{0,120}",
        last in ".{0,120}",
        major in 1i64..1_000_000i64
    ) {
        let builder = builder(AmountRule::MinorToMajor);
        let payload = builder
            .build(&record(major * 100, "REF000000001"), &customer(first.clone(), last.clone()))
            .unwrap();

        prop_assert!(payload.customer_first_name.chars().count() <= 50);
        prop_assert!(payload.customer_last_name.chars().count() <= 50);

        // Truncation, not rejection: the kept prefix is the original's
        let expected: String = first.chars().take(50).collect();
        prop_assert_eq!(payload.customer_first_name, expected);
        let expected: String = last.chars().take(50).collect();
        prop_assert_eq!(payload.customer_last_name, expected);
    }

    #[test]
    fn test_order_reference_round_trip(
        reference in "[A-Z0-9]{8,20}",
        major in 1i64..1_000_000i64
    ) {
        let builder = builder(AmountRule::MinorToMajor);
        let payload = builder
            .build(&record(major * 100, &reference), &CustomerInfo::default())
            .unwrap();
        prop_assert_eq!(payload.order_reference, reference);
    }

    #[test]
    fn test_minor_to_major_conversion_is_exact(
        major in 1i64..1_000_000i64
    ) {
        let builder = builder(AmountRule::MinorToMajor);
        let payload = builder
            .build(&record(major * 100, "REF000000001"), &CustomerInfo::default())
            .unwrap();
        prop_assert_eq!(payload.amount, major);
    }

    #[test]
    fn test_indivisible_amounts_are_rejected_under_conversion(
        major in 0i64..1_000_000i64,
        remainder in 1i64..100i64
    ) {
        let amount_minor = major * 100 + remainder;
        let builder = builder(AmountRule::MinorToMajor);
        prop_assert!(builder
            .build(&record(amount_minor, "REF000000001"), &CustomerInfo::default())
            .is_err());
    }

    #[test]
    fn test_pass_through_forwards_amount_unchanged(
        amount_minor in 1i64..100_000_000i64
    ) {
        let builder = builder(AmountRule::PassThrough);
        let payload = builder
            .build(&record(amount_minor, "REF000000001"), &CustomerInfo::default())
            .unwrap();
        prop_assert_eq!(payload.amount, amount_minor);
    }

    #[test]
    fn test_payload_tokens_are_internally_consistent(
        reference in "[A-Z0-9]{8,20}",
        major in 1i64..1_000_000i64
    ) {
        let builder = builder(AmountRule::MinorToMajor);
        let payload = builder
            .build(&record(major * 100, &reference), &CustomerInfo::default())
            .unwrap();

        prop_assert_eq!(payload.hash_token.len(), 64);
        prop_assert_eq!(
            payload.apptoken,
            format!("{}.{}", &payload.hash_token[..32], payload.appid)
        );
    }
}
