use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// One cell as seen from outside the engine.
///
/// Serialized as `null` (masked), `"F"` (flagged), `"M"` (disclosed mine)
/// or the integer count of adjacent mines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Hidden,
    Flagged,
    Revealed { adjacent: u8 },
    Mine,
}

/// Largest count a revealed cell can show: every cell of a reach-2 mask.
pub const MAX_ADJACENT: u8 = 24;

const FLAG_MARKER: &str = "F";
const MINE_MARKER: &str = "M";

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Hidden => serializer.serialize_none(),
            Cell::Flagged => serializer.serialize_str(FLAG_MARKER),
            Cell::Mine => serializer.serialize_str(MINE_MARKER),
            Cell::Revealed { adjacent } => serializer.serialize_u8(*adjacent),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Count(u8),
    Marker(String),
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<RawCell>::deserialize(deserializer)? {
            None => Ok(Cell::Hidden),
            Some(RawCell::Count(adjacent)) if adjacent <= MAX_ADJACENT => Ok(Cell::Revealed { adjacent }),
            Some(RawCell::Count(adjacent)) => Err(de::Error::custom(format!(
                "adjacent mine count {adjacent} is out of range"
            ))),
            Some(RawCell::Marker(marker)) => match marker.as_str() {
                FLAG_MARKER => Ok(Cell::Flagged),
                MINE_MARKER => Ok(Cell::Mine),
                other => Err(de::Error::custom(format!("unknown cell marker {other:?}"))),
            },
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Row and column displacement from a cell to one of its neighbors.
pub type Offset = (isize, isize);

/// The eight surrounding cells.
pub const MOORE_NEIGHBORHOOD: [Offset; 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameParams {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Neighborhood used for counts, flood fill and chording, as
    /// `[row, col]` offsets. Defaults to [`MOORE_NEIGHBORHOOD`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<Offset>>,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            mines: 10,
            seed: None,
            mask: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cell_markers_match_wire_format() {
        let row = vec![
            Cell::Hidden,
            Cell::Flagged,
            Cell::Revealed { adjacent: 0 },
            Cell::Revealed { adjacent: 3 },
            Cell::Mine,
        ];

        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!([null, "F", 0, 3, "M"])
        );
    }

    #[test]
    fn cell_parses_from_wire_format() {
        let row: Vec<Cell> = serde_json::from_value(json!([null, "F", 2, "M"])).unwrap();

        assert_eq!(
            row,
            vec![
                Cell::Hidden,
                Cell::Flagged,
                Cell::Revealed { adjacent: 2 },
                Cell::Mine
            ]
        );
    }

    #[test]
    fn cell_rejects_unknown_markers() {
        assert!(serde_json::from_value::<Cell>(json!("X")).is_err());
        assert!(serde_json::from_value::<Cell>(json!(25)).is_err());
    }

    #[test]
    fn game_params_fill_missing_fields_with_defaults() {
        let params: GameParams = serde_json::from_value(json!({ "mines": 3 })).unwrap();

        assert_eq!(params.width, 8);
        assert_eq!(params.height, 8);
        assert_eq!(params.mines, 3);
        assert_eq!(params.seed, None);
        assert_eq!(params.mask, None);
    }

    #[test]
    fn game_params_read_mask_as_offset_pairs() {
        let params: GameParams =
            serde_json::from_value(json!({ "mask": [[-1, 0], [1, 0], [0, -2]] })).unwrap();

        assert_eq!(params.mask, Some(vec![(-1, 0), (1, 0), (0, -2)]));
        assert_eq!(
            serde_json::to_value(GameParams::default()).unwrap(),
            json!({ "width": 8, "height": 8, "mines": 10 })
        );
    }
}
