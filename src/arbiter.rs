use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::error::UsageError;
use crate::fragment::Fragment;
use crate::smiles::{ring_marker_text, tokenize, Token};

pub const MAX_RING_NUMBER: u16 = 99;

/// Lowest positive ring number not in `used`.
pub fn next_free(used: &BTreeSet<u16>) -> Option<u16> {
    (1..=MAX_RING_NUMBER).find(|n| !used.contains(n))
}

/// Chooses a replacement for every guest ring number the host already
/// uses. Replacements avoid both sides and each other.
pub fn resolve(
    host: &BTreeSet<u16>,
    guest: &BTreeSet<u16>,
) -> Result<BTreeMap<u16, u16>, UsageError> {
    let mut used: BTreeSet<u16> = host.union(guest).copied().collect();
    let mut map = BTreeMap::new();
    for &ring in host.intersection(guest) {
        let free = next_free(&used).ok_or(UsageError::InvalidRingNumber {
            got: MAX_RING_NUMBER + 1,
        })?;
        debug!("ring {} already used by host, renumbering guest to {}", ring, free);
        used.insert(free);
        map.insert(ring, free);
    }
    Ok(map)
}

/// Returns `guest` with its colliding ring numbers renumbered.
pub fn arbitrate(host: &BTreeSet<u16>, guest: &Fragment) -> Result<Fragment, UsageError> {
    let map = resolve(host, &guest.ring_numbers())?;
    Ok(guest.remap_rings(&map))
}

/// Rewrites ring markers of a SMILES string through `map`, leaving all
/// other text (bracket atoms included) untouched. Text that does not
/// tokenize is returned as is.
pub fn remap_smiles(smiles: &str, map: &BTreeMap<u16, u16>) -> String {
    let Ok(tokens) = tokenize(smiles) else {
        return smiles.to_string();
    };
    let chars: Vec<char> = smiles.chars().collect();
    let mut out = String::with_capacity(smiles.len());
    let mut cursor = 0;
    for token in &tokens {
        if let Token::RingMarker { ring, raw, pos, .. } = token {
            if let Some(&to) = map.get(ring) {
                out.extend(&chars[cursor..*pos]);
                out.push_str(&ring_marker_text(to));
                cursor = pos + raw.chars().count();
            }
        }
    }
    out.extend(&chars[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_positive_number_wins() {
        assert_eq!(next_free(&BTreeSet::new()), Some(1));
        assert_eq!(next_free(&BTreeSet::from([1, 2, 4])), Some(3));
        let all: BTreeSet<u16> = (1..=99).collect();
        assert_eq!(next_free(&all), None);
    }

    #[test]
    fn only_collisions_are_renumbered() {
        let host = BTreeSet::from([1, 2]);
        let guest = BTreeSet::from([1, 3]);
        assert_eq!(resolve(&host, &guest).unwrap(), BTreeMap::from([(1, 4)]));
        assert!(resolve(&host, &BTreeSet::from([5])).unwrap().is_empty());
    }

    #[test]
    fn replacements_do_not_collide_with_each_other() {
        let host = BTreeSet::from([1, 2]);
        let guest = BTreeSet::from([1, 2]);
        assert_eq!(
            resolve(&host, &guest).unwrap(),
            BTreeMap::from([(1, 3), (2, 4)])
        );
    }

    #[test]
    fn raw_rewrite_is_token_aware() {
        let map = BTreeMap::from([(1, 2)]);
        assert_eq!(remap_smiles("[13CH]1CC=1", &map), "[13CH]2CC=2");
        assert_eq!(remap_smiles("C1CC1", &BTreeMap::from([(1, 12)])), "C%12CC%12");
        assert_eq!(remap_smiles("C%10CC%10", &BTreeMap::from([(10, 3)])), "C3CC3");
        assert_eq!(remap_smiles("C1C!", &map), "C1C!");
    }
}
