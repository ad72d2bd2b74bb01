//! Side of an infrastructure link affected by a public transport stop.

/// Which side of a link's linestring a stop serves, with regard to the
/// digitised direction of the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkSide {
    Left,
    Right,
    Both,
}

impl LinkSide {
    /// Derive the link side from the tri-state
    /// `is_on_direction_of_link_forward_traversal` column. A null flag means
    /// the direction is undefined and the stop affects both sides.
    pub fn from_forward_traversal_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => LinkSide::Right,
            Some(false) => LinkSide::Left,
            None => LinkSide::Both,
        }
    }
}
