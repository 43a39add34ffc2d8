use crate::core::{AmountRule, Currency};
use crate::modules::flow::FlowOutcome;
use crate::modules::payment::{CustomerInfo, DonationRequest};

use super::models::Scenario;

/// The built-in scenario battery
///
/// Mirrors the edge cases a live deployment keeps tripping over: edge
/// amounts, malformed input, oversized names, anonymous donors and a burst
/// of concurrent donations. Gateway-side outcomes are left unpinned; only
/// scenarios whose verdict is decided locally carry an expectation.
///
/// The amount rule shifts what an indivisible minor amount means, so the
/// battery takes it as input instead of assuming one.
pub fn builtin_scenarios(amount_rule: AmountRule) -> Vec<Scenario> {
    let donation = |amount: i64| {
        let mut request = DonationRequest::new(amount, Currency::LKR);
        request.donor_name = Some("Harness Donor".to_string());
        request.donor_email = Some("donor@example.com".to_string());
        request
    };

    let mut scenarios = vec![
        {
            let mut s = Scenario::new("standard-amount", donation(1000));
            s.donation.message = Some("Standard donation probe".to_string());
            s.check_status = true;
            s
        },
        Scenario::new("small-amount", donation(500)),
        Scenario::new("large-amount", donation(2_500_000)),
        Scenario::new("minimum-whole-unit", donation(100)),
        Scenario::new("usd-donation", {
            let mut request = donation(2000);
            request.currency = Currency::USD;
            request
        }),
        Scenario::new("anonymous-donation", DonationRequest::new(1500, Currency::LKR)),
        {
            let mut s = Scenario::new("oversized-names", donation(1000));
            s.customer = Some(CustomerInfo {
                first_name: "An Unreasonably Long First Name That Keeps Going Well Past The Limit"
                    .to_string(),
                last_name: "An Equally Long Last Name That The Gateway Would Reject Untruncated"
                    .to_string(),
                ..Default::default()
            });
            s
        },
        Scenario::new("zero-amount", DonationRequest::new(0, Currency::LKR))
            .expecting(FlowOutcome::ValidationError),
        Scenario::new("negative-amount", DonationRequest::new(-500, Currency::LKR))
            .expecting(FlowOutcome::ValidationError),
        {
            let mut s = Scenario::new("malformed-email", donation(1000));
            s.donation.donor_email = Some("not-an-email".to_string());
            s.expect = Some(FlowOutcome::ValidationError);
            s
        },
    ];

    // Indivisible minor amounts only exist under minor-to-major conversion
    if amount_rule == AmountRule::MinorToMajor {
        scenarios.push(
            Scenario::new("indivisible-minor-amount", donation(1050))
                .expecting(FlowOutcome::ValidationError),
        );
    }

    for i in 1..=5 {
        scenarios.push(
            Scenario::new(format!("concurrent-donation-{}", i), donation(1000)).concurrent(),
        );
    }

    scenarios
}
