//! Verification against the request history.

use decoy::predicate::{header, method, not, path_eq, ValueMatcher};
use decoy::{CountMatcher, MockSession, PredicateSet, Request, ResponseDefinition, VerificationError};

fn session_with_catch_all() -> MockSession {
    let session = MockSession::new();
    session
        .register(PredicateSet::new(), vec![ResponseDefinition::ok()])
        .unwrap();
    session
}

fn send(session: &MockSession, method: &str, path: &str) {
    session
        .dispatch(Request::builder(method, path).build())
        .unwrap();
}

fn at(path: &str) -> PredicateSet {
    PredicateSet::new().with(path_eq(path))
}

#[test]
fn test_count_and_verify_after_three_requests() {
    let session = session_with_catch_all();
    for _ in 0..3 {
        send(&session, "GET", "/a");
    }

    assert_eq!(session.count(&at("/a")).unwrap(), 3);
    session.verify(&at("/a"), &CountMatcher::exactly(3).unwrap()).unwrap();

    let err = session
        .verify(&at("/a"), &CountMatcher::exactly(4).unwrap())
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("path equal to \"/a\""), "{message}");
    assert!(message.contains("<4>"), "{message}");
    assert!(message.contains("was expected to be <4> but was <3>"), "{message}");
}

#[test]
fn test_received_shorthands() {
    let session = session_with_catch_all();
    send(&session, "POST", "/orders");
    send(&session, "GET", "/orders");

    session.received_once(&at("/orders").with(method("POST"))).unwrap();
    session.received_never(&at("/users")).unwrap();
    session.received_times(&at("/orders"), 2).unwrap();
    session.received_times(&at("/users"), 0).unwrap();

    assert!(matches!(
        session.received_once(&at("/orders")),
        Err(VerificationError::Failure { .. })
    ));
}

#[test]
fn test_count_bounds() {
    let session = session_with_catch_all();
    for _ in 0..4 {
        send(&session, "GET", "/poll");
    }

    session
        .verify(&at("/poll"), &CountMatcher::at_least(2).unwrap())
        .unwrap();
    session
        .verify(&at("/poll"), &CountMatcher::between(3, 5).unwrap())
        .unwrap();
    let err = session
        .verify(&at("/poll"), &CountMatcher::at_most(3).unwrap())
        .unwrap_err();
    assert!(err.to_string().contains("was expected to be at most <3> but was <4>"));
}

#[test]
fn test_negative_expectation_is_rejected_eagerly() {
    let session = session_with_catch_all();
    assert_eq!(
        session.received_times(&at("/a"), -1),
        Err(VerificationError::NegativeCount(-1))
    );
    assert_eq!(
        CountMatcher::at_least(-5),
        Err(VerificationError::NegativeCount(-5))
    );
}

#[test]
fn test_verification_impossible_once_recording_disabled() {
    let session = session_with_catch_all();
    send(&session, "GET", "/a");
    session.set_recording_enabled(false);
    send(&session, "GET", "/a");

    assert_eq!(session.count(&at("/a")), Err(VerificationError::RecordingDisabled));
    assert_eq!(
        session.verify(&PredicateSet::new(), &CountMatcher::Exactly(0)),
        Err(VerificationError::RecordingDisabled)
    );
    assert_eq!(
        session.received_never(&at("/never")),
        Err(VerificationError::RecordingDisabled)
    );

    // Re-enabling does not make the gap verifiable
    session.set_recording_enabled(true);
    send(&session, "GET", "/a");
    assert_eq!(session.count(&at("/a")), Err(VerificationError::RecordingDisabled));
    assert_eq!(session.history().len(), 2);

    session.reset();
    send(&session, "GET", "/a");
    session.received_once(&at("/a")).unwrap();
}

#[test]
fn test_find_and_negated_predicates() {
    let session = session_with_catch_all();
    session
        .dispatch(
            Request::builder("GET", "/a")
                .header("Authorization", "Bearer x")
                .build(),
        )
        .unwrap();
    send(&session, "GET", "/a");

    let anonymous = at("/a").with(not(header("Authorization", ValueMatcher::present())));
    let found = session.verifier().find(&anonymous).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].sequence, 1);
    assert!(found[0].request.headers().is_empty());
}
