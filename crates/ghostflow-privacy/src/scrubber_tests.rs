use super::*;

#[test]
fn test_email_detection_and_token() {
    let mut scrubber = PiiScrubber::new();
    let out = scrubber.scrub("contact alice@example.com please");
    assert_eq!(out, "contact [EMAIL_1] please");
}

#[test]
fn test_stable_tokens_for_repeated_values() {
    let mut scrubber = PiiScrubber::new();
    let first = scrubber.scrub("mail Alice@Example.com");
    let second = scrubber.scrub("again alice@example.com and bob@example.com");
    assert_eq!(first, "mail [EMAIL_1]");
    assert_eq!(second, "again [EMAIL_1] and [EMAIL_2]");
}

#[test]
fn test_normalization_joins_spaced_and_dashed_values() {
    let mut scrubber = PiiScrubber::new();
    let a = scrubber.scrub("card 4111 1111 1111 1111");
    let b = scrubber.scrub("card 4111-1111-1111-1111");
    assert_eq!(a, "card [CREDIT_CARD_1]");
    assert_eq!(b, "card [CREDIT_CARD_1]");
}

#[test]
fn test_reset_restarts_counters() {
    let mut scrubber = PiiScrubber::new();
    scrubber.scrub("a@b.io");
    scrubber.scrub("c@d.io");
    scrubber.reset();
    assert_eq!(scrubber.scrub("c@d.io"), "[EMAIL_1]");
}

#[test]
fn test_ssn_and_phone() {
    let mut scrubber = PiiScrubber::new();
    assert_eq!(scrubber.scrub("ssn 123-45-6789"), "ssn [SSN_1]");
    assert_eq!(scrubber.scrub("call 555-867-5309"), "call [PHONE_1]");
    assert_eq!(scrubber.scrub("call +1 (555) 867-5309"), "call [PHONE_2]");
}

#[test]
fn test_ip_and_dob() {
    let mut scrubber = PiiScrubber::new();
    assert_eq!(scrubber.scrub("from 192.168.0.12"), "from [IP_ADDRESS_1]");
    assert_eq!(scrubber.scrub("born 1990-04-17"), "born [DOB_1]");
    assert_eq!(scrubber.scrub("born 4/17/1990"), "born [DOB_2]");
}

#[test]
fn test_auth_token_forms() {
    let mut scrubber = PiiScrubber::new();
    let out = scrubber.scrub("Authorization: Bearer abcdef123456789");
    assert!(out.contains("[AUTH_TOKEN_1]"), "got: {out}");
    let out = scrubber.scrub("api_key=sk-live-0a1b2c3d4e");
    assert!(out.contains("[AUTH_TOKEN_"), "got: {out}");
    let out = scrubber.scrub("password: hunter2");
    assert!(out.contains("[AUTH_TOKEN_"), "got: {out}");
    assert!(!out.contains("hunter2"));
}

#[test]
fn test_overlap_prefers_longer_match() {
    // A credit card number contains phone-shaped substrings; the longer
    // credit card match must win.
    let entities = PiiScrubber::detect("pay with 4111 1111 1111 1111 today");
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].kind, PiiKind::CreditCard);
}

#[test]
fn test_clean_text_passes_through_unchanged() {
    let mut scrubber = PiiScrubber::new();
    let text = "nothing sensitive in here";
    assert_eq!(scrubber.scrub(text), text);
    assert!(!PiiScrubber::contains_pii(text));
}

#[test]
fn test_empty_and_odd_input_never_panics() {
    let mut scrubber = PiiScrubber::new();
    assert_eq!(scrubber.scrub(""), "");
    assert_eq!(scrubber.scrub("@@@ ... --- 🙂"), "@@@ ... --- 🙂");
}

#[test]
fn test_detect_reports_offsets() {
    let entities = PiiScrubber::detect("x a@b.io y");
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].start, 2);
    assert_eq!(entities[0].end, 8);
    assert_eq!(entities[0].value, "a@b.io");
}

#[test]
fn test_contains_pii() {
    assert!(PiiScrubber::contains_pii("reach me at x@y.co"));
    assert!(PiiScrubber::contains_pii("token=deadbeefcafe"));
    assert!(!PiiScrubber::contains_pii("hello world"));
}
