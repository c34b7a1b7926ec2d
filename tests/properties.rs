use displace_mph::{PAYLOAD_MASK, SINGLETON_BIT, build};
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 64;

fn distinct_fingerprints(max: usize) -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::hash_set(any::<u64>(), 0..max).prop_map(|s| s.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    #[test]
    fn every_key_gets_its_own_index(fps in distinct_fingerprints(600)) {
        let t = build(&fps).unwrap();
        for (i, &fp) in fps.iter().enumerate() {
            prop_assert_eq!(t.query(fp), i as i32);
        }
    }

    #[test]
    fn size_is_the_next_power_of_two(fps in distinct_fingerprints(600)) {
        let t = build(&fps).unwrap();
        let want = if fps.is_empty() { 0 } else { fps.len().next_power_of_two() };
        prop_assert_eq!(t.size(), want);
        prop_assert_eq!(t.mask(), want.saturating_sub(1) as u64);
    }

    #[test]
    fn stored_ordinals_cover_exactly_zero_to_n(fps in distinct_fingerprints(600)) {
        let t = build(&fps).unwrap();
        let mut hits = vec![0u32; fps.len()];
        for &fp in &fps {
            hits[t.query(fp) as usize] += 1;
        }
        prop_assert!(hits.iter().all(|&h| h == 1));
        for &s in t.seeds() {
            if s & SINGLETON_BIT != 0 {
                prop_assert!(((s & PAYLOAD_MASK) as usize) < t.size());
            }
        }
    }

    #[test]
    fn builds_are_reproducible(fps in distinct_fingerprints(300)) {
        let a = build(&fps).unwrap();
        let b = build(&fps).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn any_subset_builds_on_its_own(
        fps in distinct_fingerprints(300),
        picks in proptest::collection::vec(any::<bool>(), 300),
    ) {
        let sub: Vec<u64> = fps
            .iter()
            .zip(&picks)
            .filter(|&(_, &keep)| keep)
            .map(|(&fp, _)| fp)
            .collect();
        let t = build(&sub).unwrap();
        for (i, &fp) in sub.iter().enumerate() {
            prop_assert_eq!(t.query(fp), i as i32);
        }
    }

    #[test]
    fn unknown_fingerprints_stay_in_range(
        fps in distinct_fingerprints(300),
        probes in proptest::collection::vec(any::<u64>(), 1..64),
    ) {
        let t = build(&fps).unwrap();
        for p in probes {
            let v = t.query(p);
            if fps.is_empty() {
                prop_assert_eq!(v, -1);
            } else {
                prop_assert!(v >= 0 && (v as usize) < fps.len());
            }
        }
    }
}
