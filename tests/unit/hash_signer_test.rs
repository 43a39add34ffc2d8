// Property-based tests for gateway token construction
//
// Validates:
// - Hash tokens are deterministic and match ^[0-9A-F]{64}$ (full scheme)
// - App tokens are always first-32-chars + "." + app id
// - The legacy scheme is a strict prefix of the full scheme
// - No hidden state leaks between signer instances

use proptest::prelude::*;

use onepay_harness::signing::{HashSigner, TokenScheme};

fn field() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{1,40}"
}

proptest! {
    #[test]
    fn test_hash_token_is_deterministic(
        app_id in field(),
        secret in field(),
        reference in field(),
        amount in 1i64..1_000_000_000i64
    ) {
        let signer = HashSigner::new(app_id, secret, TokenScheme::Sha256);
        let first = signer.hash_token(amount, &reference).unwrap();
        let second = signer.hash_token(amount, &reference).unwrap();

        prop_assert_eq!(&first, &second, "hash token must be deterministic");
        prop_assert_eq!(first.len(), 64);
        prop_assert!(
            first.chars().all(|c| matches!(c, '0'..='9' | 'A'..='F')),
            "hash token must be uppercase hex: {}",
            first
        );
    }

    #[test]
    fn test_fresh_signers_agree(
        app_id in field(),
        secret in field(),
        reference in field(),
        amount in 1i64..1_000_000_000i64
    ) {
        // Two independent instances with identical inputs must agree,
        // confirming there is no global or per-instance hidden state
        let a = HashSigner::new(app_id.clone(), secret.clone(), TokenScheme::Sha256)
            .hash_token(amount, &reference)
            .unwrap();
        let b = HashSigner::new(app_id, secret, TokenScheme::Sha256)
            .hash_token(amount, &reference)
            .unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_legacy_token_is_prefix_of_full(
        app_id in field(),
        secret in field(),
        reference in field(),
        amount in 1i64..1_000_000_000i64
    ) {
        let full = HashSigner::new(app_id.clone(), secret.clone(), TokenScheme::Sha256)
            .hash_token(amount, &reference)
            .unwrap();
        let legacy = HashSigner::new(app_id, secret, TokenScheme::Legacy32)
            .hash_token(amount, &reference)
            .unwrap();

        prop_assert_eq!(legacy.len(), 32);
        prop_assert_eq!(&full[..32], &legacy[..]);
    }

    #[test]
    fn test_app_token_shape(
        app_id in field(),
        secret in field(),
        reference in field(),
        amount in 1i64..1_000_000_000i64
    ) {
        let signer = HashSigner::new(app_id.clone(), secret, TokenScheme::Sha256);
        let hash = signer.hash_token(amount, &reference).unwrap();
        let token = signer.app_token(&hash).unwrap();

        prop_assert_eq!(token, format!("{}.{}", &hash[..32], app_id));
    }

    #[test]
    fn test_app_token_accepts_any_hash_of_32_or_more(
        prefix in "[0-9A-F]{32}",
        tail in "[0-9A-F]{0,32}",
        app_id in field()
    ) {
        let hash = format!("{}{}", prefix, tail);
        let token = HashSigner::new(app_id.clone(), "secret", TokenScheme::Sha256)
            .app_token(&hash)
            .unwrap();
        prop_assert_eq!(token, format!("{}.{}", prefix, app_id));
    }

    #[test]
    fn test_app_token_rejects_short_hashes(
        short in "[0-9A-F]{0,31}",
        app_id in field()
    ) {
        let result = HashSigner::new(app_id, "secret", TokenScheme::Sha256).app_token(&short);
        prop_assert!(result.is_err());
    }

    #[test]
    fn test_non_positive_amounts_are_rejected(
        app_id in field(),
        secret in field(),
        reference in field(),
        amount in -1_000_000i64..=0i64
    ) {
        let signer = HashSigner::new(app_id, secret, TokenScheme::Sha256);
        prop_assert!(signer.hash_token(amount, &reference).is_err());
    }

    #[test]
    fn test_verify_accepts_own_output(
        app_id in field(),
        secret in field(),
        reference in field(),
        amount in 1i64..1_000_000_000i64,
        scheme in prop_oneof![Just(TokenScheme::Sha256), Just(TokenScheme::Legacy32)]
    ) {
        let signer = HashSigner::new(app_id, secret, scheme);
        let token = signer.hash_token(amount, &reference).unwrap();
        prop_assert!(signer.verify_token(&token).is_ok());
    }
}
