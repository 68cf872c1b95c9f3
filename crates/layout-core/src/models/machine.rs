//! Machine model and layout block lookup

use serde::{Deserialize, Serialize};

/// Block label returned for machine numbers outside every block.
pub const UNKNOWN_BLOCK: char = '?';

/// A machine slot on the factory floor and its assigned construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub construct_id: Option<String>,
    pub last_edited_by: Option<String>,
    pub last_edited_at: Option<String>,
}

/// A construct reassignment to mirror to the remote backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineChange {
    pub machine_id: i64,
    pub construct_id: Option<String>,
    pub previous_construct_id: Option<String>,
    pub user_id: Option<String>,
}

type BlockRange = (i64, i64);

const BLOCKS: [(char, &[BlockRange]); 4] = [
    ('A', &[(1, 160)]),
    (
        'B',
        &[
            (201, 220),
            (261, 280),
            (321, 340),
            (381, 400),
            (441, 460),
            (501, 520),
            (561, 580),
            (621, 640),
        ],
    ),
    (
        'C',
        &[
            (181, 200),
            (241, 260),
            (301, 320),
            (361, 380),
            (421, 440),
            (481, 500),
            (541, 560),
            (601, 620),
        ],
    ),
    (
        'D',
        &[
            (161, 180),
            (221, 240),
            (281, 300),
            (341, 360),
            (401, 420),
            (461, 480),
            (521, 540),
            (581, 600),
        ],
    ),
];

/// Layout block (`A`..`D`) that a machine number belongs to, or
/// [`UNKNOWN_BLOCK`].
pub fn machine_block(machine_number: i64) -> char {
    BLOCKS
        .iter()
        .find(|(_, ranges)| {
            ranges
                .iter()
                .any(|(start, end)| (*start..=*end).contains(&machine_number))
        })
        .map_or(UNKNOWN_BLOCK, |(block, _)| *block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_a_is_contiguous() {
        assert_eq!(machine_block(1), 'A');
        assert_eq!(machine_block(160), 'A');
    }

    #[test]
    fn interleaved_blocks_resolve_by_range() {
        assert_eq!(machine_block(161), 'D');
        assert_eq!(machine_block(181), 'C');
        assert_eq!(machine_block(201), 'B');
        assert_eq!(machine_block(240), 'D');
        assert_eq!(machine_block(640), 'B');
    }

    #[test]
    fn out_of_range_numbers_are_unknown() {
        assert_eq!(machine_block(0), UNKNOWN_BLOCK);
        assert_eq!(machine_block(641), UNKNOWN_BLOCK);
        assert_eq!(machine_block(-5), UNKNOWN_BLOCK);
    }
}
