//! Agent state on the grid.

/// Linear index into a row-major grid: `row * cols + col`.
pub type CellIndex = usize;

/// Heading of an agent. The wire encoding is `0..=3` in this order; reports
/// use the single characters `E`, `S`, `W`, `N`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    East,
    South,
    West,
    North,
}

impl Orientation {
    /// Decode the wire encoding. Returns `None` for anything outside `0..=3`.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::East),
            1 => Some(Self::South),
            2 => Some(Self::West),
            3 => Some(Self::North),
            _ => None,
        }
    }

    /// Wire encoding of this heading.
    pub fn index(self) -> u8 {
        match self {
            Self::East => 0,
            Self::South => 1,
            Self::West => 2,
            Self::North => 3,
        }
    }

    /// Report character for this heading.
    pub fn as_char(self) -> char {
        match self {
            Self::East => 'E',
            Self::South => 'S',
            Self::West => 'W',
            Self::North => 'N',
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
            Self::North => Self::East,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
            Self::North => Self::West,
        }
    }
}

/// Pose of one agent at one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentState {
    pub location: CellIndex,
    pub orientation: Orientation,
    pub timestep: i32,
}

impl AgentState {
    pub fn new(location: CellIndex, orientation: Orientation, timestep: i32) -> Self {
        Self {
            location,
            orientation,
            timestep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_round_trip() {
        for index in 0..4u8 {
            let orientation = Orientation::from_index(index).unwrap();
            assert_eq!(orientation.index(), index);
        }
        assert!(Orientation::from_index(4).is_none());
    }

    #[test]
    fn test_rotations_are_inverse() {
        let mut orientation = Orientation::East;
        for _ in 0..4 {
            assert_eq!(
                orientation.clockwise().counter_clockwise(),
                orientation
            );
            orientation = orientation.clockwise();
        }
        assert_eq!(orientation, Orientation::East);
    }
}
