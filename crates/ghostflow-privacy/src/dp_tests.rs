use super::*;

#[test]
fn test_timestamp_bucket_granularity() {
    let mut dp = DifferentialPrivacy::with_seed(1.0, 7);
    // 2026-08-01T10:07:13Z
    let bucket = dp.anonymize_timestamp(1_785_578_833_000);
    // Must land on a 5-minute boundary near the input.
    let parsed = chrono::DateTime::parse_from_rfc3339(&bucket).unwrap();
    assert_eq!(parsed.timestamp() % 300, 0);
    let delta = (parsed.timestamp_millis() - 1_785_578_833_000).abs();
    assert!(delta < 600_000, "bucket drifted {delta} ms");
}

#[test]
fn test_timestamp_noise_varies() {
    let mut dp = DifferentialPrivacy::with_seed(1.0, 11);
    let buckets: std::collections::HashSet<String> =
        (0..200).map(|_| dp.anonymize_timestamp(1_785_578_833_000)).collect();
    // With 30 s noise around a boundary-adjacent instant, more than one
    // bucket must appear across many draws.
    assert!(buckets.len() > 1);
}

#[test]
fn test_randomized_response_flip_rate() {
    let mut dp = DifferentialPrivacy::with_seed(1.0, 3);
    let flips = (0..10_000).filter(|_| !dp.randomized_response(true)).count();
    let rate = flips as f64 / 10_000.0;
    assert!((0.07..=0.13).contains(&rate), "flip rate {rate}");
}

#[test]
fn test_perturbed_vector_is_unit_norm_and_quantized() {
    let mut dp = DifferentialPrivacy::with_seed(1.0, 5);
    let input = vec![1.0 / (128.0f32).sqrt(); 128];
    let out = dp.perturb_vector(&input);
    assert_eq!(out.len(), 128);

    let norm: f32 = out.iter().map(|v| v * v).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 0.01, "norm {norm}");
    for v in &out {
        let scaled = v * 10_000.0;
        assert!((scaled - scaled.round()).abs() < 1e-3, "not quantized: {v}");
    }
}

#[test]
fn test_perturbation_changes_the_vector() {
    let mut dp = DifferentialPrivacy::with_seed(1.0, 9);
    let input = vec![0.1f32; 128];
    assert_ne!(dp.perturb_vector(&input), input);
}

#[test]
fn test_session_fingerprint_rotates_across_buckets() {
    // Aligned to a 15-minute boundary so base + 60 s stays in the bucket.
    let base = 1_983_976i64 * 900_000;
    let this_bucket = DifferentialPrivacy::session_fingerprint("dev-1", "user-1", base);
    let same_bucket =
        DifferentialPrivacy::session_fingerprint("dev-1", "user-1", base + 60_000);
    let next_bucket =
        DifferentialPrivacy::session_fingerprint("dev-1", "user-1", base + 900_000 + 1);

    assert_eq!(this_bucket.len(), 64);
    assert!(this_bucket.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(this_bucket, same_bucket);
    assert_ne!(this_bucket, next_bucket);
}

#[test]
fn test_session_fingerprint_varies_by_identity() {
    let a = DifferentialPrivacy::session_fingerprint("dev-1", "user-1", 0);
    let b = DifferentialPrivacy::session_fingerprint("dev-2", "user-1", 0);
    let c = DifferentialPrivacy::session_fingerprint("dev-1", "user-2", 0);
    assert_ne!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_structural_hash_shape() {
    let path = vec!["body".to_string(), "form".to_string(), "input".to_string()];
    let hash = DifferentialPrivacy::structural_hash(&path, "input");
    assert_eq!(hash.len(), 8);
    assert_eq!(hash, DifferentialPrivacy::structural_hash(&path, "input"));
    assert_ne!(hash, DifferentialPrivacy::structural_hash(&path, "button"));
}

#[test]
fn test_element_signature_format() {
    let path: Vec<String> = ["main", "section", "form", "div", "input"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        DifferentialPrivacy::element_signature("input", None, &path),
        "input@form>div>input"
    );
    assert_eq!(
        DifferentialPrivacy::element_signature("button", Some("button"), &path[..2].to_vec()),
        "button[button]@main>section"
    );
}
