// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::types::DirEntry;
use remotefs_proto::messages as wire;

pub fn entries_to_wire(entries: &[DirEntry]) -> Vec<wire::DirEntry> {
    entries
        .iter()
        .map(|e| wire::DirEntry {
            name: e.name.as_bytes().to_vec(),
            mode: e.mode,
        })
        .collect()
}

/// Names that are not valid UTF-8 are decoded lossily
pub fn entries_from_wire(entries: &[wire::DirEntry]) -> Vec<DirEntry> {
    entries
        .iter()
        .map(|e| DirEntry {
            name: String::from_utf8_lossy(&e.name).into_owned(),
            mode: e.mode,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{S_IFDIR, S_IFREG};

    #[test]
    fn empty_listing_stays_empty() {
        let wire = entries_to_wire(&[]);
        assert!(wire.is_empty());
        assert!(entries_from_wire(&wire).is_empty());
    }

    #[test]
    fn order_and_duplicates_are_preserved() {
        let entries = vec![
            DirEntry::new("zeta", S_IFREG),
            DirEntry::new("alpha", S_IFDIR),
            DirEntry::new("zeta", S_IFREG),
            DirEntry::new("ünïcode", S_IFREG | 0o600),
        ];
        assert_eq!(entries_from_wire(&entries_to_wire(&entries)), entries);
    }
}
