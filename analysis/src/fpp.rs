// Prints the false positive rate, bits per entry and serialized size of each filter width.
//
// Usage: fpp [num_elements]

extern crate rand;
extern crate xorfilter;

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashSet;
use xorfilter::{Strategy, XorFilter};

const DEFAULT_SIZE: usize = 1_000_000;
const PROBES: usize = 1_000_000;

fn random_strings(n: usize, len: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| (&mut rng).sample_iter(&Alphanumeric).take(len).map(char::from).collect())
        .collect()
}

fn main() {
    let size = match std::env::args().nth(1) {
        Some(arg) => arg.parse().expect("Expected a number of elements"),
        None => DEFAULT_SIZE,
    };

    let elements = random_strings(size, 20);
    let members: HashSet<&String> = elements.iter().collect();
    // Longer strings cannot collide with members.
    let probes = random_strings(PROBES, 21);

    println!("strategy,elements,capacity,bits_per_entry,serialized_bytes,fpp,expected_fpp");
    for strategy in Strategy::ALL {
        let filter = XorFilter::build(&elements, strategy, None).expect("Filter construction");
        let false_positives = probes
            .iter()
            .filter(|p| !members.contains(p) && filter.might_contain(*p))
            .count();

        println!(
            "{},{},{},{:.3},{},{:.6},{:.6}",
            strategy,
            size,
            filter.capacity(),
            filter.bits_per_entry(size),
            filter.serialized_len(),
            false_positives as f64 / PROBES as f64,
            strategy.false_positive_rate(),
        );
    }
}
