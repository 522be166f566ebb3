use serde::{Deserialize, Serialize};

/// One event placed on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: i32,
    pub id: i32,
    pub weight: i32,
}

impl Event {
    pub fn new(event_type: i32, id: i32, weight: i32) -> Self {
        Self {
            event_type,
            id,
            weight,
        }
    }

    /// An event whose three fields all resolve to 0 is treated as absent.
    pub fn is_blank(&self) -> bool {
        self.event_type == 0 && self.id == 0 && self.weight == 0
    }
}

/// A map tile that carries at least one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub pos: i32,
    pub x: i32,
    pub y: i32,
    pub tile_id: i32,
    pub events: Vec<Event>,
}

impl Cell {
    pub fn new(pos: i32, x: i32, y: i32) -> Self {
        Self {
            pos,
            x,
            y,
            tile_id: 0,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    pub map_id: i32,
    pub width: i32,
    pub height: i32,
    pub cells: Vec<Cell>,
}

impl MapDocument {
    pub fn new(map_id: i32, width: i32, height: i32, cells: Vec<Cell>) -> Self {
        Self {
            map_id,
            width,
            height,
            cells,
        }
    }

    pub fn event_count(&self) -> usize {
        self.cells.iter().map(|cell| cell.events.len()).sum()
    }
}
