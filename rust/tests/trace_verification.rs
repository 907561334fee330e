use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tree_verifier::{
    format_snapshot_line, parse_debug_output, verify_output, Entry, Tree, TreeType,
    VerifierConfig, VerifierError, Violation, BLACK, NULL_INDEX, RED,
};

/// Height-balanced tree over `keys`, with nodes scattered over random slots.
fn balanced_entries(keys: &[u64], rng: &mut StdRng) -> Vec<Entry> {
    fn build(
        keys: &[u64],
        slots: &[usize],
        lo: usize,
        hi: usize,
        parent: Option<u64>,
        entries: &mut [Entry],
    ) -> Option<u64> {
        if lo >= hi {
            return None;
        }
        let mid = (lo + hi) / 2;
        let slot = slots[mid];
        let left = build(keys, slots, lo, mid, Some(slot as u64), entries);
        let right = build(keys, slots, mid + 1, hi, Some(slot as u64), entries);
        entries[slot] = Entry {
            key: keys[mid],
            value: mid as u64,
            parent,
            left_child: left,
            right_child: right,
            metadata: 0,
        };
        Some(slot as u64)
    }

    let mut slots: Vec<usize> = (0..keys.len()).collect();
    slots.shuffle(rng);
    let mut entries = vec![Entry::default(); keys.len()];
    build(keys, &slots, 0, keys.len(), None, &mut entries);
    entries
}

/// Store each node's computed balance factor in its metadata.
fn with_avl_metadata(entries: &[Entry]) -> Vec<Entry> {
    let tree = Tree::new(entries, TreeType::Vanilla).unwrap();
    tree.entries()
        .iter()
        .map(|node| node.entry.with_metadata((node.avl_balance + 128) as u8))
        .collect()
}

fn sorted_keys(rng: &mut StdRng, count: usize) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..count as u64).map(|k| k * 10 + rng.gen_range(0..10)).collect();
    keys.sort_unstable();
    keys
}

#[test]
fn test_parse_round_trip_random_entries() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let count = rng.gen_range(1..40);
        let random_index = |rng: &mut StdRng| {
            if rng.gen_bool(0.3) {
                None
            } else {
                Some(rng.gen_range(0..NULL_INDEX))
            }
        };
        let entries: Vec<Entry> = (0..count)
            .map(|_| Entry {
                key: rng.gen(),
                value: rng.gen(),
                parent: random_index(&mut rng),
                left_child: random_index(&mut rng),
                right_child: random_index(&mut rng),
                metadata: rng.gen(),
            })
            .collect();

        let text = format!("some noise\n{}\nmore noise", format_snapshot_line(&entries));
        let snapshots = parse_debug_output(&text).unwrap();
        assert_eq!(snapshots, vec![entries]);
    }
}

#[test]
fn test_built_trees_have_one_root_and_consistent_heights() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..30 {
        let count = rng.gen_range(1..300);
        let keys = sorted_keys(&mut rng, count);
        let entries = balanced_entries(&keys, &mut rng);
        let tree = Tree::new(&entries, TreeType::Vanilla).unwrap();

        let roots: Vec<usize> = tree
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.entry.parent.is_none())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(roots, vec![tree.root()]);

        for node in tree.entries() {
            let expected = 1 + tree
                .height_at(node.entry.left_child)
                .max(tree.height_at(node.entry.right_child));
            assert_eq!(node.height, expected);
        }

        let in_order: Vec<u64> = tree.in_order().map(|(_, node)| node.entry.key).collect();
        assert_eq!(in_order, keys);
        assert!(tree.verify_strict().is_empty());
    }
}

#[test]
fn test_avl_metadata_corruption_is_located() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..30 {
        let count = rng.gen_range(2..200);
        let keys = sorted_keys(&mut rng, count);
        let mut entries = with_avl_metadata(&balanced_entries(&keys, &mut rng));

        let tree = Tree::new(&entries, TreeType::Avl).unwrap();
        assert!(tree.verify_avl_balance().is_empty());
        assert!(tree.is_valid());

        let victim = rng.gen_range(0..count);
        entries[victim].metadata = entries[victim].metadata.wrapping_add(1);
        let tree = Tree::new(&entries, TreeType::Avl).unwrap();
        let violations = tree.verify_avl_balance();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].index(), victim);
        assert!(violations[0].to_string().contains(&format!("at {}", victim)));
    }
}

#[test]
fn test_perfect_red_black_trees() {
    let mut rng = StdRng::seed_from_u64(31);
    for levels in 1..10u32 {
        let count = (1usize << levels) - 1;
        let keys = sorted_keys(&mut rng, count);
        let all_black: Vec<Entry> = balanced_entries(&keys, &mut rng)
            .into_iter()
            .map(|e| e.with_metadata(BLACK))
            .collect();

        let tree = Tree::new(&all_black, TreeType::RedBlack).unwrap();
        assert_eq!(tree.entries()[tree.root()].black_height, u64::from(levels));
        assert!(tree.verify_strict().is_empty());

        // Red leaves keep every path's black count equal.
        let red_leaves: Vec<Entry> = all_black
            .iter()
            .map(|e| match (e.left_child, e.right_child) {
                (None, None) if levels > 1 => e.with_metadata(RED),
                _ => *e,
            })
            .collect();
        let tree = Tree::new(&red_leaves, TreeType::RedBlack).unwrap();
        assert!(tree.verify_red_black().is_empty());
    }
}

#[test]
fn test_red_red_is_flagged() {
    // black root, black 5, black 15, red 3 under 5, red 1 under 3
    let entries = vec![
        Entry::new(10, 0).with_children(Some(1), Some(2)).with_metadata(BLACK),
        Entry::new(5, 0).with_parent(0).with_children(Some(3), None).with_metadata(BLACK),
        Entry::new(15, 0).with_parent(0).with_metadata(BLACK),
        Entry::new(3, 0).with_parent(1).with_children(Some(4), None).with_metadata(RED),
        Entry::new(1, 0).with_parent(3).with_metadata(RED),
    ];
    let tree = Tree::new(&entries, TreeType::RedBlack).unwrap();
    let violations = tree.verify_red_black();
    assert_eq!(violations, vec![Violation::RedRed { index: 3 }]);
    assert!(!tree.verify_all().is_empty());
}

#[test]
fn test_corrupt_left_child_fails_shape_check() {
    let mut rng = StdRng::seed_from_u64(43);
    let keys = sorted_keys(&mut rng, 63);
    let mut entries = with_avl_metadata(&balanced_entries(&keys, &mut rng));

    let (node, _) = entries
        .iter()
        .enumerate()
        .find(|(_, e)| e.left_child.is_some())
        .unwrap();
    let stranger = entries
        .iter()
        .position(|e| e.parent.is_some() && e.parent != Some(node as u64))
        .unwrap();
    entries[node].left_child = Some(stranger as u64);

    let tree = Tree::new(&entries, TreeType::Avl).unwrap();
    assert!(!tree.verify_child().is_empty());
    let violations = tree.verify_all();
    assert!(!violations.is_empty());
    assert!(violations.iter().all(Violation::is_structural));
}

#[test]
fn test_missing_field_is_a_parse_error() {
    let line = format_snapshot_line(&[Entry::new(1, 2), Entry::new(3, 4).with_parent(0)]);
    let broken = line.replacen(
        ", 0, 18446744073709551615, 18446744073709551615, 0 }",
        ", 0, 0 }",
        1,
    );
    assert_ne!(line, broken);

    let err = parse_debug_output(&broken).unwrap_err();
    assert!(matches!(err, VerifierError::MissingFields { found: 4, .. }));
    assert!(err.is_parse_error());
}

/// Every node is the right child of the one before it.
fn right_chain(len: usize) -> Vec<Entry> {
    (0..len)
        .map(|i| {
            let entry =
                Entry::new(i as u64, 0).with_children(None, (i + 1 < len).then(|| i as u64 + 1));
            if i == 0 {
                entry
            } else {
                entry.with_parent(i as u64 - 1)
            }
        })
        .collect()
}

#[test]
fn test_degenerate_chain_does_not_overflow() {
    const CHAIN: usize = 100_000;
    let tree = Tree::new(&right_chain(CHAIN), TreeType::Vanilla).unwrap();
    assert_eq!(tree.entries()[0].height, CHAIN as u64);
    assert_eq!(tree.entries()[0].avl_balance, CHAIN as i64 - 1);
    assert!(tree.verify_strict().is_empty());
    assert_eq!(tree.post_order().count(), CHAIN);

    // Prefixes grow with depth, so draw a shorter chain.
    let short = Tree::new(&right_chain(2_000), TreeType::Vanilla).unwrap();
    assert_eq!(short.render().lines().count(), 2_000);
}

#[test]
fn test_rendering_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(53);
    let keys = sorted_keys(&mut rng, 100);
    let entries = with_avl_metadata(&balanced_entries(&keys, &mut rng));
    let tree = Tree::new(&entries, TreeType::Avl).unwrap();

    let mut first = Vec::new();
    let mut second = Vec::new();
    tree.print_with_header(&mut first).unwrap();
    tree.print_with_header(&mut second).unwrap();
    assert_eq!(first, second);
    assert_eq!(tree.render().lines().count(), 100);
}

#[test]
fn test_pipeline_over_a_captured_run() {
    let mut rng = StdRng::seed_from_u64(61);
    let mut output = String::from(
        "INCLUDING DEPENDENCY MoveStdlib\nBUILDING avl\nRunning Move unit tests\n",
    );
    for size in [1, 2, 5, 17] {
        let keys = sorted_keys(&mut rng, size);
        let entries = with_avl_metadata(&balanced_entries(&keys, &mut rng));
        output.push_str(&format_snapshot_line(&entries));
        output.push('\n');
    }
    output.push_str("[ PASS    ] 0x1::avl::test_insert\n");
    output.push_str("Test result: OK. Total tests: 1; passed: 1; failed: 0\n");

    let report = verify_output(&output, &VerifierConfig::new(TreeType::Avl).strict(true)).unwrap();
    assert_eq!(report.snapshots.len(), 4);
    assert!(report.is_clean());

    let report = verify_output(&output, &VerifierConfig::new(TreeType::RedBlack)).unwrap();
    assert!(report.snapshots.iter().all(|s| s.tree.tree_type() == TreeType::RedBlack));
}
