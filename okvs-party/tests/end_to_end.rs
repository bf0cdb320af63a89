//! Full protocol runs over localhost TCP: an aggregator thread and K share
//! party threads, one connection each.

use std::io::Write;
use std::path::PathBuf;
use std::thread;

use okvs_core::{Block, Matrix};
use okvs_party::{
    derive_value, Aggregator, AggregatorConfig, AggregatorError, PartyConfig, ShareParty,
    DEFAULT_SECRET,
};

fn write_key_file(keys: &[u64]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    for k in keys {
        writeln!(f, "{k}").unwrap();
    }
    f
}

fn spawn_aggregator(
    key_path: PathBuf,
    num_parties: usize,
) -> (
    std::net::SocketAddr,
    thread::JoinHandle<Result<Matrix<Block>, AggregatorError>>,
) {
    let config = AggregatorConfig::builder()
        .listen_addr("127.0.0.1:0".into())
        .key_path(key_path)
        .num_parties(num_parties)
        .build()
        .unwrap();
    let aggregator = Aggregator::bind(config).unwrap();
    let addr = aggregator.local_addr().unwrap();
    (addr, thread::spawn(move || aggregator.run()))
}

fn run_party(key_path: PathBuf, addr: std::net::SocketAddr, party_id: u64, secret: Block) {
    let config = PartyConfig::builder()
        .party_id(party_id)
        .key_path(key_path)
        .aggregator_addr(addr.to_string())
        .secret(secret)
        .build()
        .unwrap();
    ShareParty::new(config).run().unwrap();
}

#[test]
fn identical_secrets_combine_to_zero() {
    let keys = [1u64, 2, 3];
    let keyfile = write_key_file(&keys);
    let (addr, aggregator) = spawn_aggregator(keyfile.path().to_path_buf(), 2);

    let parties: Vec<_> = (0..2)
        .map(|id| {
            let path = keyfile.path().to_path_buf();
            thread::spawn(move || run_party(path, addr, id, DEFAULT_SECRET))
        })
        .collect();
    for p in parties {
        p.join().unwrap();
    }

    // Both parties derive bit-identical shares, so every combined value
    // cancels to zero.
    let combined = aggregator.join().unwrap().unwrap();
    assert_eq!(combined, Matrix::new(keys.len(), 1));
}

#[test]
fn distinct_secrets_combine_to_share_xor() {
    let keys = [10u64, 20, 30, 40, 50];
    let keyfile = write_key_file(&keys);
    let (addr, aggregator) = spawn_aggregator(keyfile.path().to_path_buf(), 2);

    let secrets = [Block::from_u64(0xaaaa), Block::from_u64(0xbbbb)];
    let parties: Vec<_> = secrets
        .iter()
        .enumerate()
        .map(|(id, &secret)| {
            let path = keyfile.path().to_path_buf();
            thread::spawn(move || run_party(path, addr, id as u64, secret))
        })
        .collect();
    for p in parties {
        p.join().unwrap();
    }

    let combined = aggregator.join().unwrap().unwrap();
    for (i, &k) in keys.iter().enumerate() {
        let key = Block::from_u64(k);
        let expected = derive_value(secrets[0], key) ^ derive_value(secrets[1], key);
        assert_eq!(combined[(i, 0)], expected);
    }
}

#[test]
fn three_parties_combine() {
    let keys = [7u64, 8, 9];
    let keyfile = write_key_file(&keys);
    let (addr, aggregator) = spawn_aggregator(keyfile.path().to_path_buf(), 3);

    let secrets = [
        Block::from_u64(1),
        Block::from_u64(2),
        Block::from_u64(3),
    ];
    let parties: Vec<_> = secrets
        .iter()
        .enumerate()
        .map(|(id, &secret)| {
            let path = keyfile.path().to_path_buf();
            thread::spawn(move || run_party(path, addr, id as u64, secret))
        })
        .collect();
    for p in parties {
        p.join().unwrap();
    }

    let combined = aggregator.join().unwrap().unwrap();
    for (i, &k) in keys.iter().enumerate() {
        let key = Block::from_u64(k);
        let expected = secrets
            .iter()
            .fold(Block::ZERO, |acc, &s| acc ^ derive_value(s, key));
        assert_eq!(combined[(i, 0)], expected);
    }
}

#[test]
fn duplicate_party_id_rejected() {
    let keys = [1u64, 2];
    let keyfile = write_key_file(&keys);
    let (addr, aggregator) = spawn_aggregator(keyfile.path().to_path_buf(), 2);

    let path = keyfile.path().to_path_buf();
    let first = thread::spawn(move || run_party(path, addr, 0, DEFAULT_SECRET));
    first.join().unwrap();

    // Second connection claims the same identity; the aggregator aborts.
    let path = keyfile.path().to_path_buf();
    let second = thread::spawn(move || {
        let config = PartyConfig::builder()
            .party_id(0)
            .key_path(path)
            .aggregator_addr(addr.to_string())
            .build()
            .unwrap();
        // The aggregator may close the connection before or after the
        // frame goes out; either way it must not combine.
        let _ = ShareParty::new(config).run();
    });
    second.join().unwrap();

    assert!(matches!(
        aggregator.join().unwrap(),
        Err(AggregatorError::DuplicateParty(0))
    ));
}

#[test]
fn out_of_range_party_id_rejected() {
    let keys = [1u64];
    let keyfile = write_key_file(&keys);
    let (addr, aggregator) = spawn_aggregator(keyfile.path().to_path_buf(), 1);

    let path = keyfile.path().to_path_buf();
    let config = PartyConfig::builder()
        .party_id(5)
        .key_path(path)
        .aggregator_addr(addr.to_string())
        .build()
        .unwrap();
    let party = thread::spawn(move || {
        let _ = ShareParty::new(config).run();
    });
    party.join().unwrap();

    assert!(matches!(
        aggregator.join().unwrap(),
        Err(AggregatorError::PartyOutOfRange { id: 5, .. })
    ));
}
