//! Policy construction and signing properties
//!
//! Covers canonical ordering, build-time validation and the sign/verify
//! contract, all against an injected clock.

use assert_matches::assert_matches;
use depot_core::{DepotError, FixedTimeSource, Flag, FlagSet, ValidationError};
use depot_security::{
    PolicyConstraints, PolicyDocument, PolicyPermission, PolicySecret, PolicySigner,
};
use proptest::prelude::*;

const NOW: u64 = 1_735_689_600;
const FUTURE: u64 = NOW + 3_600;
const PAST: u64 = NOW - 1;

fn clock() -> FixedTimeSource {
    FixedTimeSource(NOW)
}

fn build(permissions: &[PolicyPermission], expiry: u64) -> Result<PolicyDocument, DepotError> {
    PolicyDocument::build(
        FlagSet::from_flags(permissions.iter().copied()),
        expiry,
        None,
        &clock(),
    )
}

#[test]
fn permission_order_does_not_change_encoding() {
    let a = build(&[PolicyPermission::Stat, PolicyPermission::Read], FUTURE).unwrap();
    let b = build(&[PolicyPermission::Read, PolicyPermission::Stat], FUTURE).unwrap();

    assert_eq!(a.canonical_encoding(), b.canonical_encoding());
    assert_eq!(a.call_tokens(), vec!["read", "stat"]);

    let json: serde_json::Value = serde_json::from_slice(a.canonical_encoding()).unwrap();
    assert_eq!(json["call"], serde_json::json!(["read", "stat"]));
    assert_eq!(json["expiry"], serde_json::json!(FUTURE));
}

#[test]
fn empty_permissions_rejected_regardless_of_expiry() {
    for expiry in [FUTURE, PAST, 0, u64::MAX] {
        assert_matches!(
            build(&[], expiry),
            Err(DepotError::Validation(ValidationError::EmptyPermissionSet))
        );
    }
}

#[test]
fn past_expiry_rejected() {
    assert_matches!(
        build(&[PolicyPermission::Read], PAST),
        Err(DepotError::Validation(ValidationError::PastExpiry { expiry: PAST, now: NOW }))
    );
}

#[test]
fn sign_then_verify() {
    let secret = PolicySecret::from("MY-APP-SECRET");
    let doc = build(&[PolicyPermission::Read, PolicyPermission::Convert], FUTURE).unwrap();
    let signed = PolicySigner::sign(doc.canonical_encoding(), &secret).unwrap();

    assert_eq!(
        PolicySigner::verify(signed.policy_encoding(), signed.signature(), &secret),
        Ok(true)
    );

    // One flipped hex character
    let mut tampered: Vec<char> = signed.signature().chars().collect();
    tampered[10] = if tampered[10] == '0' { '1' } else { '0' };
    let tampered: String = tampered.into_iter().collect();
    assert_eq!(
        PolicySigner::verify(signed.policy_encoding(), &tampered, &secret),
        Ok(false)
    );

    // Different secret
    assert_eq!(
        PolicySigner::verify(
            signed.policy_encoding(),
            signed.signature(),
            &PolicySecret::from("OTHER-SECRET")
        ),
        Ok(false)
    );

    // Truncated signature
    assert_eq!(
        PolicySigner::verify(
            signed.policy_encoding(),
            &signed.signature()[..63],
            &secret
        ),
        Ok(false)
    );
}

#[test]
fn signed_policy_renders_as_query() {
    let secret = PolicySecret::from("k");
    let doc = build(&[PolicyPermission::Pick], FUTURE).unwrap();
    let signed = PolicySigner::sign_document(&doc, &secret).unwrap();

    let query = signed.to_query_string();
    let (policy, signature) = query.split_once('&').unwrap();
    assert_eq!(policy, format!("policy={}", signed.policy_encoding()));
    assert_eq!(signature, format!("signature={}", signed.signature()));
    assert!(!signed.policy_encoding().contains(&['+', '/'][..]));
}

#[test]
fn constraints_survive_signing() {
    let secret = PolicySecret::from("k");
    let constraints = PolicyConstraints::new()
        .with_handle("AbC123")
        .with_size_bounds(None, Some(5_000_000));
    let doc = PolicyDocument::build(
        FlagSet::from(PolicyPermission::Write),
        FUTURE,
        Some(constraints.clone()),
        &clock(),
    )
    .unwrap();
    let signed = PolicySigner::sign_document(&doc, &secret).unwrap();

    let opened = PolicySigner::open(signed.policy_encoding(), signed.signature(), &secret).unwrap();
    assert_eq!(opened.constraints(), &constraints);
}

fn permission_subset() -> impl Strategy<Value = Vec<PolicyPermission>> {
    proptest::collection::vec(proptest::sample::select(PolicyPermission::ORDER), 1..16)
}

proptest! {
    #[test]
    fn encoding_independent_of_supply_order(perms in permission_subset(), ttl in 1u64..1_000_000) {
        let forward = build(&perms, NOW + ttl).unwrap();
        let mut reversed = perms.clone();
        reversed.reverse();
        let backward = build(&reversed, NOW + ttl).unwrap();

        prop_assert_eq!(forward.canonical_encoding(), backward.canonical_encoding());

        let tokens = forward.call_tokens();
        let mut sorted = tokens.clone();
        sorted.sort_unstable();
        prop_assert_eq!(tokens, sorted);
    }

    #[test]
    fn signature_is_pure(perms in permission_subset(), secret in proptest::collection::vec(any::<u8>(), 0..64)) {
        let secret = PolicySecret::new(secret);
        let doc = build(&perms, FUTURE).unwrap();

        let first = PolicySigner::sign_document(&doc, &secret).unwrap();
        let second = PolicySigner::sign(doc.canonical_encoding(), &secret).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            PolicySigner::verify(first.policy_encoding(), first.signature(), &secret),
            Ok(true)
        );
        prop_assert_eq!(first.decode_document().unwrap(), doc);
    }
}
