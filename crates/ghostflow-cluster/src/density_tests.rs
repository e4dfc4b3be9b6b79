use super::*;
use crate::window::EventSequence;
use chrono::{Duration, Utc};

fn sequence(session: &str, embedding: Vec<f32>, minutes_offset: i64) -> EventSequence {
    EventSequence {
        session_fingerprint: session.into(),
        events: Vec::new(),
        embedding,
        timestamp: Utc::now() + Duration::minutes(minutes_offset),
    }
}

#[test]
fn test_cosine_basics() {
    assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert_eq!(cosine(&[], &[]), 0.0);
    assert_eq!(cosine(&[1.0], &[1.0, 0.0]), 0.0);
    assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
}

#[test]
fn test_similar_sequences_cluster_across_sessions() {
    let sequences = vec![
        sequence("s1", vec![1.0, 0.0], 0),
        sequence("s2", vec![0.99, 0.01], 5),
        sequence("s3", vec![0.98, 0.02], 10),
    ];
    let clusters = cluster_sequences(sequences);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members.len(), 3);
    assert_eq!(clusters[0].occurrences(), 3);
}

#[test]
fn test_dissimilar_sequences_do_not_cluster() {
    let sequences = vec![
        sequence("s1", vec![1.0, 0.0], 0),
        sequence("s2", vec![0.0, 1.0], 1),
        sequence("s3", vec![1.0, 0.0], 2),
    ];
    let clusters = cluster_sequences(sequences);
    // Two sessions agree, which is below the three-session minimum.
    assert!(clusters.is_empty());
}

#[test]
fn test_temporal_window_excludes_distant_sequences() {
    let sequences = vec![
        sequence("s1", vec![1.0, 0.0], 0),
        sequence("s2", vec![1.0, 0.0], 10),
        sequence("s3", vec![1.0, 0.0], 45),
    ];
    let clusters = cluster_sequences(sequences);
    assert!(clusters.is_empty(), "s3 is outside the 30-minute window");
}

#[test]
fn test_single_session_windows_are_not_recurrence() {
    // Many overlapping windows from one session must not count as three
    // occurrences.
    let sequences = vec![
        sequence("s1", vec![1.0, 0.0], 0),
        sequence("s1", vec![1.0, 0.0], 0),
        sequence("s1", vec![1.0, 0.0], 0),
        sequence("s1", vec![1.0, 0.0], 0),
    ];
    assert!(cluster_sequences(sequences).is_empty());
}

#[test]
fn test_centroid_is_member_mean() {
    let sequences = vec![
        sequence("s1", vec![1.0, 0.0], 0),
        sequence("s2", vec![0.8, 0.2], 1),
        sequence("s3", vec![0.9, 0.1], 2),
    ];
    let clusters = cluster_sequences(sequences);
    let centroid = &clusters[0].centroid;
    assert!((centroid[0] - 0.9).abs() < 1e-6);
    assert!((centroid[1] - 0.1).abs() < 1e-6);
}

#[test]
fn test_empty_input() {
    assert!(cluster_sequences(Vec::new()).is_empty());
}
