use rand::Rng;
use std::cmp::Ordering;
use topocmp::prelude::*;
use topocmp::reference;

const SCENARIO: [&str; 4] = ["foo", "foo-fleem", "foo/bar", "foo/bar/baz"];

fn random_path<R: Rng>(rng: &mut R, max_len: usize) -> Vec<u8> {
    const ALPHABET: &[u8] = b"ab-./_0Z\x01\x2e\x30\xff";
    let len = rng.random_range(0..max_len);
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
        .collect()
}

#[test]
fn test_literal_scenario() {
    let mut input: Vec<String> = SCENARIO.iter().rev().map(|s| s.to_string()).collect();
    topo_sort_mut(&mut input);
    assert_eq!(input, vec!["foo", "foo/bar", "foo/bar/baz", "foo-fleem"]);
}

#[test]
fn test_literal_scenario_every_backend() {
    for cmp in Comparator::available() {
        let mut input = SCENARIO.to_vec();
        input.sort_by(|a, b| cmp.compare_bytes(a.as_bytes(), b.as_bytes()));
        assert_eq!(
            input,
            vec!["foo", "foo/bar", "foo/bar/baz", "foo-fleem"],
            "backend {}",
            cmp.level()
        );
    }
}

#[test]
fn test_topological_pairs() {
    assert_eq!(compare_bytes(b"foo", b"foo/bar"), Ordering::Less);
    assert_eq!(compare_bytes(b"foo", b"foo-fleem"), Ordering::Less);
    assert_eq!(compare_bytes(b"foo/bar", b"foo-fleem"), Ordering::Less);
    assert_eq!(compare_bytes(b"foo/bar", b"foo.txt"), Ordering::Less);
    assert_eq!(compare_bytes(b"foo/zzz", b"foo0"), Ordering::Less);
    assert_eq!(compare_bytes(b"foo", b"foobar"), Ordering::Less);
    assert_eq!(compare_bytes(b"foobar", b"foo"), Ordering::Greater);
}

#[test]
fn test_empty_and_identical() {
    assert_eq!(compare_bytes(b"", b""), Ordering::Equal);
    assert_eq!(compare_bytes(b"", b"a"), Ordering::Less);
    assert_eq!(compare_bytes(b"/", b""), Ordering::Greater);

    let path = b"some/long/path/that/spans/more/than/one/block";
    assert_eq!(compare_bytes(path, path), Ordering::Equal);

    let padded = PaddedPath::new(path).unwrap();
    let view = padded.as_padded();
    assert_eq!(compare(&view, &view), Ordering::Equal);
    // SAFETY: `PaddedPath` carries its terminator and slack.
    let same = unsafe { topocmp::compare_raw(view.as_ptr(), view.as_ptr()) };
    assert_eq!(same, Ordering::Equal);
}

#[test]
fn test_slice_stops_at_zero() {
    assert_eq!(compare_bytes(b"foo\0bar", b"foo"), Ordering::Equal);
    assert_eq!(compare_bytes(b"foo\0zzz", b"foo/a"), Ordering::Less);
}

#[test]
fn test_padded_path_rejects_interior_nul() {
    let err = PaddedPath::new(b"foo\0bar").unwrap_err();
    assert_eq!(err, topocmp::PathError::InteriorNul { position: 3 });

    let mut arena = PathArena::new();
    assert!(arena.push("ok").is_ok());
    assert!(arena.push(b"\0").is_err());
    assert_eq!(arena.len(), 1);
}

#[test]
fn test_padded_path_ord() {
    let mut paths: Vec<PaddedPath> = SCENARIO
        .iter()
        .rev()
        .map(|s| PaddedPath::new(s).unwrap())
        .collect();
    paths.sort();
    let sorted: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
    assert_eq!(sorted, vec!["foo", "foo/bar", "foo/bar/baz", "foo-fleem"]);
}

#[test]
fn test_arena_sort() {
    let names = [
        "src/block/sse2.rs",
        "src",
        "src-old",
        "src/block",
        "src.bak",
        "src/block/mod.rs",
        "src/lib.rs",
        "",
    ];
    let arena: PathArena = names.iter().collect();
    let indices = topo_sort(&arena);
    let sorted: Vec<&[u8]> = indices.iter().map(|&i| arena.get(i).as_bytes()).collect();
    assert_eq!(
        sorted,
        vec![
            b"".as_slice(),
            b"src".as_slice(),
            b"src/block".as_slice(),
            b"src/block/mod.rs".as_slice(),
            b"src/block/sse2.rs".as_slice(),
            b"src/lib.rs".as_slice(),
            b"src-old".as_slice(),
            b"src.bak".as_slice(),
        ]
    );
    assert!(is_topo_sorted(&sorted));
}

#[test]
fn test_vec_deque() {
    use std::collections::VecDeque;
    let input: VecDeque<String> = VecDeque::from(vec![
        "a-b".to_string(),
        "a/b".to_string(),
        "a".to_string(),
    ]);

    let indices = topo_sort(&input);

    let sorted: Vec<&String> = indices.iter().map(|&i| &input[i]).collect();
    assert_eq!(sorted, vec!["a", "a/b", "a-b"]);
}

#[test]
fn test_empty() {
    let input: Vec<String> = vec![];
    assert!(topo_sort(&input).is_empty());
    assert!(is_topo_sorted(&input));
}

#[test]
fn test_directory_children_contiguous() {
    let mut input = vec![
        "foo/bar", "foo+", "foo", "foo.d/x", "foo/a-b", "foo/a/b", "foo/a", "foo!", "foo/",
    ];
    topo_sort_mut(&mut input);
    let first = input.iter().position(|p| *p == "foo").unwrap();
    let children: Vec<&str> = input[first + 1..]
        .iter()
        .take_while(|p| p.starts_with("foo/"))
        .copied()
        .collect();
    assert_eq!(children, vec!["foo/", "foo/a", "foo/a/b", "foo/a-b", "foo/bar"]);
    assert!(input[first + 1 + children.len()..].iter().all(|p| !p.starts_with("foo/")));
}

#[test]
fn test_fuzz_random_against_reference() {
    let mut rng = rand::rng();
    let comparators: Vec<Comparator> = Comparator::available().collect();

    for _ in 0..20_000 {
        let a = random_path(&mut rng, 50);
        let b = if rng.random_bool(0.5) {
            let mut b = a.clone();
            let cut = rng.random_range(0..=b.len());
            b.truncate(cut);
            b.extend(random_path(&mut rng, 20));
            b
        } else {
            random_path(&mut rng, 50)
        };

        let expected = reference::compare(&a, &b);
        let pa = PaddedPath::new(&a).unwrap();
        let pb = PaddedPath::new(&b).unwrap();
        for cmp in &comparators {
            assert_eq!(cmp.compare_bytes(&a, &b), expected, "{} {a:?} {b:?}", cmp.level());
            assert_eq!(
                cmp.compare(&pa.as_padded(), &pb.as_padded()),
                expected,
                "{} {a:?} {b:?}",
                cmp.level()
            );
        }
    }
}

#[test]
fn test_fuzz_random_mut() {
    let mut rng = rand::rng();

    for _ in 0..2_000 {
        let count = rng.random_range(0..40);
        let mut input: Vec<Vec<u8>> = (0..count).map(|_| random_path(&mut rng, 40)).collect();

        let mut expected = input.clone();
        expected.sort_by(|a, b| reference::compare(a, b));

        topo_sort_mut(&mut input);
        assert_eq!(input, expected);
    }
}

#[test]
fn test_fuzz_arena_matches_vec() {
    let mut rng = rand::rng();

    for _ in 0..200 {
        let count = rng.random_range(100..600);
        let input: Vec<Vec<u8>> = (0..count).map(|_| random_path(&mut rng, 70)).collect();
        let arena: PathArena = input.iter().collect();

        let from_vec: Vec<&[u8]> = topo_sort(&input).iter().map(|&i| input[i].as_slice()).collect();
        let from_arena: Vec<&[u8]> = topo_sort(&arena)
            .iter()
            .map(|&i| arena.get(i).as_bytes())
            .collect();
        assert_eq!(from_vec, from_arena);
        assert!(is_topo_sorted(&from_vec));
    }
}
