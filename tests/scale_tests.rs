use rand::Rng;
use std::cmp::Ordering;
use std::time::Instant;
use topocmp::prelude::*;
use topocmp::reference;

/// Builds a synthetic directory tree listing with deep shared prefixes.
fn synthetic_tree<R: Rng>(rng: &mut R, count: usize) -> Vec<String> {
    const NAMES: [&str; 8] = ["src", "src-old", "lib", "lib.rs", "a", "a-b", "node_modules", "x.y"];
    (0..count)
        .map(|_| {
            let depth = rng.random_range(1..8);
            (0..depth)
                .map(|_| NAMES[rng.random_range(0..NAMES.len())])
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

#[test]
fn test_sort_200k_paths() {
    let count = 200_000;
    let mut rng = rand::rng();
    println!("Generating {} paths...", count);
    let input = synthetic_tree(&mut rng, count);

    println!("Sorting {} paths...", count);
    let start = Instant::now();
    let indices = topo_sort(&input);
    println!("Sorted {} paths in {:?}", count, start.elapsed());

    assert_eq!(indices.len(), count);

    for i in 0..count - 1 {
        let a = &input[indices[i]];
        let b = &input[indices[i + 1]];
        assert_ne!(
            reference::compare(a.as_bytes(), b.as_bytes()),
            Ordering::Greater,
            "Sort failed at index {}",
            i
        );
    }
}

#[test]
fn test_sort_arena_200k_paths() {
    let count = 200_000;
    let mut rng = rand::rng();
    let input = synthetic_tree(&mut rng, count);
    let arena: PathArena = input.iter().collect();

    let start = Instant::now();
    let indices = topo_sort(&arena);
    println!("Sorted {} arena paths in {:?}", count, start.elapsed());

    let sorted: Vec<&[u8]> = indices.iter().map(|&i| arena.get(i).as_bytes()).collect();
    assert!(is_topo_sorted(&sorted));
}
