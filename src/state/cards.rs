//! Pick-list ordering and bingo card generation.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::state::game::BingoColumn;

/// Number of cells on a 5x5 card.
pub const GRID_CELLS: usize = 25;
/// Row-major index of the centre cell.
pub const FREE_CELL_INDEX: usize = 12;
const GRID_WIDTH: usize = 5;
const FREE_LABEL: &str = "FREE";

/// Alphabet for human-typable session codes (no 0/O, 1/I).
pub const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Length of a session code.
pub const SESSION_CODE_LEN: usize = 5;

/// Anything that can be placed on a bingo card.
pub trait CardItem {
    /// Stable identifier of the item.
    fn item_id(&self) -> Uuid;
    /// Track title.
    fn title(&self) -> &str;
    /// Artist name, possibly blank.
    fn artist(&self) -> &str;
}

/// Order in which template items are turned into calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PickMode {
    /// Keep the template order.
    #[default]
    Setlist,
    /// Uniformly random order.
    Shuffle,
}

/// Card layout variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CardVariant {
    /// Free centre cell, any line wins.
    #[default]
    Standard,
    /// Every cell must be marked.
    Blackout,
    /// Last card standing without a line wins.
    Death,
}

impl CardVariant {
    /// Whether the centre cell is a free space.
    pub fn has_free_cell(self) -> bool {
        matches!(self, CardVariant::Standard)
    }

    /// Number of distinct items a single card needs.
    pub fn required_items(self) -> usize {
        if self.has_free_cell() {
            GRID_CELLS - 1
        } else {
            GRID_CELLS
        }
    }
}

/// How cell labels are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    /// `Title — Artist`.
    #[default]
    TrackArtist,
    /// Title only.
    TrackOnly,
}

/// One cell of a bingo grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BingoCell {
    /// 0-based row.
    pub row: u8,
    /// 0-based column.
    pub col: u8,
    /// Column heading the cell sits under.
    pub column: BingoColumn,
    /// True for the centre free space.
    pub free: bool,
    /// Item the cell references; absent only on the free space.
    pub item_id: Option<Uuid>,
    /// Printed label.
    pub label: String,
}

/// A 5x5 bingo card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BingoCard {
    /// 1-based number printed on the card.
    pub card_number: u32,
    /// Cells in row-major order.
    pub cells: Vec<BingoCell>,
}

/// Errors raised while generating cards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    /// The pool cannot fill one card.
    #[error("bingo cards need at least {required} items, only {available} available")]
    InsufficientPool {
        /// Items one card needs.
        required: usize,
        /// Items in the pool.
        available: usize,
    },
}

/// Order `items` according to `mode`.
pub fn build_pick_list<T, R>(items: &[T], mode: PickMode, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let mut picks = items.to_vec();
    if mode == PickMode::Shuffle {
        picks.shuffle(rng);
    }
    picks
}

/// Generate `card_count` cards drawn independently from the shared pool.
///
/// Two cards may end up identical; with a pool barely larger than one card that is likely.
pub fn build_cards<T, R>(
    items: &[T],
    card_count: u32,
    variant: CardVariant,
    label_mode: LabelMode,
    rng: &mut R,
) -> Result<Vec<BingoCard>, CardError>
where
    T: CardItem,
    R: Rng + ?Sized,
{
    let required = variant.required_items();
    if items.len() < required {
        return Err(CardError::InsufficientPool {
            required,
            available: items.len(),
        });
    }

    let mut pool: Vec<&T> = items.iter().collect();
    let cards = (1..=card_count)
        .map(|card_number| {
            pool.shuffle(rng);
            let mut picks = pool.iter().take(required);
            let cells = (0..GRID_CELLS)
                .map(|index| {
                    let row = (index / GRID_WIDTH) as u8;
                    let col = (index % GRID_WIDTH) as u8;
                    let column = BingoColumn::for_grid_column(index % GRID_WIDTH);
                    if variant.has_free_cell() && index == FREE_CELL_INDEX {
                        return BingoCell {
                            row,
                            col,
                            column,
                            free: true,
                            item_id: None,
                            label: FREE_LABEL.to_owned(),
                        };
                    }
                    // `required` picks exist and exactly `required` non-free cells are laid out.
                    let item = picks.next().copied();
                    BingoCell {
                        row,
                        col,
                        column,
                        free: false,
                        item_id: item.map(CardItem::item_id),
                        label: item.map(|item| cell_label(item, label_mode)).unwrap_or_default(),
                    }
                })
                .collect();
            BingoCard { card_number, cells }
        })
        .collect();

    Ok(cards)
}

/// Printed label of an item.
pub fn cell_label<T: CardItem + ?Sized>(item: &T, label_mode: LabelMode) -> String {
    let title = item.title().trim();
    let artist = item.artist().trim();
    match label_mode {
        LabelMode::TrackArtist if !artist.is_empty() => format!("{title} — {artist}"),
        _ => title.to_owned(),
    }
}

/// Draw a random session code.
pub fn generate_session_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SESSION_CODE_LEN)
        .map(|_| {
            let index = rng.random_range(0..SESSION_CODE_ALPHABET.len());
            char::from(SESSION_CODE_ALPHABET[index])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[derive(Clone)]
    struct Track {
        id: Uuid,
        title: String,
        artist: String,
    }

    impl CardItem for Track {
        fn item_id(&self) -> Uuid {
            self.id
        }
        fn title(&self) -> &str {
            &self.title
        }
        fn artist(&self) -> &str {
            &self.artist
        }
    }

    fn pool(size: usize) -> Vec<Track> {
        (0..size)
            .map(|n| Track {
                id: Uuid::new_v4(),
                title: format!("Track {n}"),
                artist: format!("Artist {n}"),
            })
            .collect()
    }

    #[test]
    fn setlist_preserves_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(build_pick_list(&items, PickMode::Setlist, &mut rng), items);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let items: Vec<u32> = (0..50).collect();
        let mut picks = build_pick_list(&items, PickMode::Shuffle, &mut rng);
        assert_ne!(picks, items);
        picks.sort_unstable();
        assert_eq!(picks, items);
    }

    #[test]
    fn standard_cards_need_24_items() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = build_cards(
            &pool(23),
            1,
            CardVariant::Standard,
            LabelMode::TrackArtist,
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CardError::InsufficientPool {
                required: 24,
                available: 23
            }
        );
    }

    #[test]
    fn blackout_cards_need_25_items() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = build_cards(
            &pool(24),
            1,
            CardVariant::Blackout,
            LabelMode::TrackArtist,
            &mut rng,
        );
        assert!(matches!(
            result,
            Err(CardError::InsufficientPool { required: 25, .. })
        ));
    }

    #[test]
    fn standard_card_has_single_free_centre() {
        let mut rng = StdRng::seed_from_u64(3);
        let items = pool(30);
        let cards = build_cards(
            &items,
            10,
            CardVariant::Standard,
            LabelMode::TrackArtist,
            &mut rng,
        )
        .unwrap();
        assert_eq!(cards.len(), 10);
        for card in &cards {
            assert_eq!(card.cells.len(), GRID_CELLS);
            let free: Vec<usize> = card
                .cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.free)
                .map(|(index, _)| index)
                .collect();
            assert_eq!(free, vec![FREE_CELL_INDEX]);
            assert_eq!(card.cells[FREE_CELL_INDEX].label, "FREE");
            assert_eq!(card.cells[FREE_CELL_INDEX].column, BingoColumn::N);
        }
    }

    #[test]
    fn blackout_cells_all_reference_distinct_items() {
        let mut rng = StdRng::seed_from_u64(5);
        let items = pool(25);
        let known: HashSet<Uuid> = items.iter().map(|item| item.id).collect();
        let cards = build_cards(
            &items,
            4,
            CardVariant::Blackout,
            LabelMode::TrackArtist,
            &mut rng,
        )
        .unwrap();
        for card in cards {
            assert!(card.cells.iter().all(|cell| !cell.free));
            let ids: HashSet<Uuid> = card.cells.iter().filter_map(|cell| cell.item_id).collect();
            assert_eq!(ids.len(), GRID_CELLS);
            assert!(ids.is_subset(&known));
        }
    }

    #[test]
    fn cells_are_laid_out_row_major() {
        let mut rng = StdRng::seed_from_u64(9);
        let cards =
            build_cards(&pool(40), 1, CardVariant::Death, LabelMode::TrackOnly, &mut rng).unwrap();
        let cell = &cards[0].cells[7];
        assert_eq!((cell.row, cell.col), (1, 2));
        assert_eq!(cell.column, BingoColumn::N);
        assert_eq!(cards[0].card_number, 1);

        let centre = &cards[0].cells[12];
        assert_eq!((centre.row, centre.col), (2, 2));
        assert!(!centre.free);
        assert!(centre.item_id.is_some());
        assert!(cards[0].cells.iter().all(|cell| !cell.free));
    }

    #[test]
    fn labels_follow_mode() {
        let track = Track {
            id: Uuid::new_v4(),
            title: "Superstition".into(),
            artist: "Stevie Wonder".into(),
        };
        assert_eq!(
            cell_label(&track, LabelMode::TrackArtist),
            "Superstition — Stevie Wonder"
        );
        assert_eq!(cell_label(&track, LabelMode::TrackOnly), "Superstition");

        let anonymous = Track {
            artist: "  ".into(),
            ..track
        };
        assert_eq!(cell_label(&anonymous, LabelMode::TrackArtist), "Superstition");
    }

    #[test]
    fn session_codes_use_unambiguous_alphabet() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let code = generate_session_code(&mut rng);
            assert_eq!(code.len(), SESSION_CODE_LEN);
            assert!(code.bytes().all(|b| SESSION_CODE_ALPHABET.contains(&b)));
        }
    }
}
