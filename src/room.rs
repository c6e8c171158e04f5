//! Rooms: the discrete grid cells a game runtime walks through.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::biomes::Biome;

/// Grid coordinate of a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Coord {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// Unit offset; north is +y.
    pub fn offset(self) -> (i64, i64, i64) {
        match self {
            Direction::North => (0, 1, 0),
            Direction::East => (1, 0, 0),
            Direction::South => (0, -1, 0),
            Direction::West => (-1, 0, 0),
            Direction::Up => (0, 0, 1),
            Direction::Down => (0, 0, -1),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How water moves through a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowType {
    Spring,
    Sink,
    Straight,
    Left,
    Right,
    StraightLeft,
    StraightRight,
    LeftRight,
    StraightLeftRight,
}

impl FlowType {
    /// Narrative template; `[origin]`, `[straight]`, `[left]` and `[right]`
    /// are direction placeholders.
    pub fn description(self) -> &'static str {
        match self {
            FlowType::Spring => "Clear, fresh water is gurgling out of the ground here.",
            FlowType::Sink => "Water is sinking into cracks in the ground.",
            FlowType::Straight => "A stream is flowing from [origin] to the [straight] here.",
            FlowType::Left => "A stream is flowing from [origin] to [left] here.",
            FlowType::Right => "A stream is flowing from [origin] to the [right] here.",
            FlowType::StraightLeft => "The stream forks here, flowing [straight] and [left].",
            FlowType::StraightRight => "The stream forks here, flowing [straight] and [right].",
            FlowType::LeftRight => "The stream splits here, flowing [left] and [right].",
            FlowType::StraightLeftRight => "The stream flows from the [origin] and fans out in all directions.",
        }
    }
}

/// A water feature in a room. Springs have no origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Water {
    pub flow_type: FlowType,
    pub origin: Option<Direction>,
}

impl Water {
    pub fn spring() -> Self {
        Self { flow_type: FlowType::Spring, origin: None }
    }
}

/// One grid cell of the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub coord: Coord,
    pub biome: Biome,
    /// Whittaker elevation bucket
    pub elevation: i32,
    /// Whittaker moisture bucket
    pub moisture: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<Water>,
}

impl Room {
    pub fn new(coord: Coord, biome: Biome, elevation: i32, moisture: i32) -> Self {
        Self { coord, biome, elevation, moisture, water: None }
    }

    pub fn with_water(mut self, water: Water) -> Self {
        self.water = Some(water);
        self
    }
}
