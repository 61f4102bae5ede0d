//! Calibration marker table.

use serde::{Deserialize, Serialize};

use crate::math::{Pt2, Real};

/// One calibration marker: a named expected position on the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    /// Expected normalized position, origin bottom-left, y up.
    pub x: Real,
    pub y: Real,
}

impl Marker {
    pub fn position(&self) -> Pt2 {
        Pt2::new(self.x, self.y)
    }
}

/// Ordered table of expected marker positions.
///
/// By convention index 0 is the center marker; drift correction anchors on
/// the remaining outer markers. The table length is configurable, algorithms
/// must not assume a fixed count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerTable {
    markers: Vec<Marker>,
}

impl MarkerTable {
    pub fn new(markers: Vec<Marker>) -> Self {
        Self { markers }
    }

    /// The reference deployment: center plus four corners.
    ///
    /// Corner abscissae derive from the 384-unit surface grid used by the
    /// stimulus display (114/384 and 270/384).
    pub fn reference_five() -> Self {
        let corner_left = 114.0 / 384.0;
        let corner_right = 270.0 / 384.0;
        Self::new(vec![
            Marker {
                name: "center".into(),
                x: 0.5,
                y: 0.5,
            },
            Marker {
                name: "bottom_left".into(),
                x: corner_left,
                y: 1.0 / 3.0,
            },
            Marker {
                name: "top_left".into(),
                x: corner_left,
                y: 2.0 / 3.0,
            },
            Marker {
                name: "top_right".into(),
                x: corner_right,
                y: 2.0 / 3.0,
            },
            Marker {
                name: "bottom_right".into(),
                x: corner_right,
                y: 1.0 / 3.0,
            },
        ])
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    /// Indices of the outer (non-center) markers used for drift anchoring.
    pub fn outer_indices(&self) -> impl Iterator<Item = usize> {
        1..self.markers.len()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.markers.get(index).map(|m| m.name.as_str())
    }
}

impl Default for MarkerTable {
    fn default() -> Self {
        Self::reference_five()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_table_shape() {
        let table = MarkerTable::reference_five();
        assert_eq!(table.len(), 5);
        assert_eq!(table.name(0), Some("center"));
        assert_eq!(table.name(4), Some("bottom_right"));
        assert_eq!(table.outer_indices().count(), 4);
    }

    #[test]
    fn table_json_roundtrip() {
        let table = MarkerTable::reference_five();
        let json = serde_json::to_string(&table).unwrap();
        let back: MarkerTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
