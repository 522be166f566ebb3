use crate::utils::helpers::column_name;

/// Title, field names and type annotations occupy the first three rows.
pub const DATA_START_ROW: usize = 3;

/// Columns holding one event slot. `percent` feeds the event's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventColumns {
    pub event: usize,
    pub percent: usize,
    pub id: usize,
}

impl EventColumns {
    pub const fn new(event: usize, percent: usize, id: usize) -> Self {
        Self { event, percent, id }
    }

    pub fn describe(&self) -> String {
        format!(
            "{}/{}/{}",
            column_name(self.event),
            column_name(self.percent),
            column_name(self.id)
        )
    }
}

/// Where each field of a map row lives in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub data_start_row: usize,
    pub pos: usize,
    pub events: [EventColumns; 3],
}

impl ColumnLayout {
    /// Position in `pos_col`, followed by three (event, percent, id) triples.
    pub const fn starting_at(pos_col: usize) -> Self {
        Self {
            data_start_row: DATA_START_ROW,
            pos: pos_col,
            events: [
                EventColumns::new(pos_col + 1, pos_col + 2, pos_col + 3),
                EventColumns::new(pos_col + 4, pos_col + 5, pos_col + 6),
                EventColumns::new(pos_col + 7, pos_col + 8, pos_col + 9),
            ],
        }
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_a_through_j() {
        let layout = ColumnLayout::default();
        assert_eq!(layout.data_start_row, 3);
        assert_eq!(column_name(layout.pos), "A");
        assert_eq!(layout.events[0].describe(), "B/C/D");
        assert_eq!(layout.events[1].describe(), "E/F/G");
        assert_eq!(layout.events[2].describe(), "H/I/J");
    }
}
