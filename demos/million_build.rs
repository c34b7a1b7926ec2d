use displace_mph::{Builder, MphError};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;
use std::time::Instant;

const N_KEYS: usize = 1_000_000;
const GEN_SEED: u64 = 42;

fn main() -> Result<(), MphError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("--- displace_mph ---");
    println!("n = {N_KEYS}");

    // 1) Generate unique keys
    let t0 = Instant::now();
    let keys = gen_unique_keys(N_KEYS, GEN_SEED);
    let gen_s = t0.elapsed().as_secs_f64();
    println!(
        "gen:    {:>8.3} s   ({:.1} M keys/s)",
        gen_s,
        N_KEYS as f64 / gen_s / 1e6
    );

    // 2) Fingerprint + build
    let t1 = Instant::now();
    let mph = Builder::new().build_keys(keys.iter().map(|v| v.as_slice()))?;
    let build_s = t1.elapsed().as_secs_f64();
    println!(
        "build:  {:>8.3} s   ({:.1} M keys/s)   size={} ({} KiB)",
        build_s,
        N_KEYS as f64 / build_s / 1e6,
        mph.table().size(),
        mph.table().memory_usage_bytes() / 1024
    );

    // 3) Lookup all keys
    let t2 = Instant::now();
    let mut acc: i32 = 0;
    for chunk in keys.chunks(32_768) {
        for k in chunk {
            acc ^= mph.index(k);
        }
    }
    let lookup_s = t2.elapsed().as_secs_f64();
    println!(
        "lookup: {:>8.3} s   ({:.1} M lookups/s)   (acc={acc})",
        lookup_s,
        N_KEYS as f64 / lookup_s / 1e6
    );

    // 4) Persisted size
    let bytes = mph.to_bytes()?;
    println!("bytes:  {}", bytes.len());

    println!("----------------------------------------------");
    println!("Total (gen + build + lookup): {:.3} s", gen_s + build_s + lookup_s);

    Ok(())
}

/// Generate N unique 16-byte keys (raw bytes), deterministically.
fn gen_unique_keys(n: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = HashSet::with_capacity(n * 2);
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let mut buf = [0u8; 16];
        rng.fill_bytes(&mut buf);
        if set.insert(buf) {
            keys.push(buf.to_vec());
        }
    }
    keys
}
