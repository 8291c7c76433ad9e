// Bucket classification and tier total tests

use archive_stats::models::{Tier, TierTotals, classify_bucket};

#[test]
fn classify_known_buckets() {
    assert_eq!(classify_bucket("mwa01fs"), Some(Tier::Dmf));
    assert_eq!(classify_bucket("mwa02fs"), Some(Tier::Dmf));
    assert_eq!(classify_bucket("mwa03fs"), Some(Tier::Dmf));
    assert_eq!(classify_bucket("mwa04fs"), Some(Tier::Dmf));
    assert_eq!(classify_bucket("volt01fs"), Some(Tier::Dmf));
    assert_eq!(classify_bucket("mwaingest-2"), Some(Tier::Banksia));
}

#[test]
fn classify_matches_substrings_anywhere() {
    assert_eq!(classify_bucket("backup-mwa01fs-old"), Some(Tier::Dmf));
    assert_eq!(classify_bucket("mwaingest"), Some(Tier::Banksia));
}

#[test]
fn classify_unknown_bucket_is_none() {
    assert_eq!(classify_bucket("random-bucket"), None);
    assert_eq!(classify_bucket(""), None);
    // close but not a rule substring
    assert_eq!(classify_bucket("mwa05fs"), None);
}

#[test]
fn scenario_partition() {
    let buckets = ["mwa01fs", "mwaingest-2", "random-bucket"];
    let mut totals = TierTotals::new();
    let mut skipped = Vec::new();
    for bucket in buckets {
        match classify_bucket(bucket) {
            Some(tier) => totals.add(tier, 100),
            None => skipped.push(bucket),
        }
    }
    assert_eq!(totals.bytes(Tier::Dmf), 100);
    assert_eq!(totals.bytes(Tier::Banksia), 100);
    assert_eq!(totals.total(), 200);
    assert_eq!(skipped, vec!["random-bucket"]);
}

#[test]
fn tier_totals_sum_exactly_once() {
    // every classified bucket lands in exactly one tier total
    let buckets = [
        ("mwa01fs", 10_u64),
        ("mwa02fs", 20),
        ("mwaingest-7", 40),
        ("volt01fs-archive", 5),
    ];
    let mut totals = TierTotals::new();
    for (bucket, bytes) in buckets {
        let tier = classify_bucket(bucket).expect("classifiable");
        totals.add(tier, bytes);
    }
    assert_eq!(totals.bytes(Tier::Dmf), 35);
    assert_eq!(totals.bytes(Tier::Banksia), 40);
    assert_eq!(totals.total(), 75);
}

#[test]
fn tier_labels_round_trip_display() {
    assert_eq!(Tier::Dmf.to_string(), "DMF");
    assert_eq!(Tier::Banksia.to_string(), "Banksia");
    assert_eq!(Tier::Acacia.to_string(), "Acacia");
    assert_eq!(Tier::AcaciaMwa.to_string(), "Acacia_mwa");
}
