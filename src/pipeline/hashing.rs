//! Content hashing for incremental change detection.
//!
//! A fast 64-bit non-cryptographic digest is enough: the hash only has to
//! answer "did this file change since the last run".

use rayon::prelude::*;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

use crate::extract::FileInfo;
use crate::pipeline::CancelToken;

/// Digest of one file's content.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// Hash every file in parallel. Each task writes only its own slot of the
/// pre-allocated result vector; unreadable files hash to 0 and are treated
/// as changed on the next run that can read them.
pub fn hash_files(
    root: &Path,
    files: &[FileInfo],
    threads: usize,
    cancel: &CancelToken,
) -> Vec<(String, u64)> {
    let mut results: Vec<(String, u64)> = files
        .iter()
        .map(|f| (f.rel_path.clone(), 0u64))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(1, files.len().max(1)))
        .build();

    let hash_one = |slot: &mut (String, u64)| {
        if cancel.is_cancelled() {
            return;
        }
        if let Ok(bytes) = std::fs::read(root.join(&slot.0)) {
            slot.1 = hash_bytes(&bytes);
        }
    };

    match pool {
        Ok(pool) => pool.install(|| results.par_iter_mut().for_each(hash_one)),
        Err(_) => results.iter_mut().for_each(hash_one),
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = hash_bytes(b"package main\n");
        let b = hash_bytes(b"package main\n");
        let c = hash_bytes(b"package other\n");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn parallel_hashing_fills_every_slot() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for i in 0..8 {
            let name = format!("f{i}.go");
            fs::write(dir.path().join(&name), format!("package f{i}\n")).unwrap();
            files.push(FileInfo::new(name, Language::Go));
        }
        let cancel = CancelToken::new();
        let hashes = hash_files(dir.path(), &files, 4, &cancel);
        assert_eq!(hashes.len(), 8);
        assert!(hashes.iter().all(|(_, h)| *h != 0));
        // Deterministic across runs.
        let again = hash_files(dir.path(), &files, 2, &cancel);
        assert_eq!(hashes, again);
    }
}
