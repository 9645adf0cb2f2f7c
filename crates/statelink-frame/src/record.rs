//! The state record exchanged between the two nodes.

/// Number of fields in a [`Record`].
pub const FIELD_COUNT: usize = 6;

/// A record slot, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CurrX,
    CurrY,
    PredX,
    PredY,
    GoalX,
    GoalY,
}

impl Field {
    /// All fields in wire order.
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::CurrX,
        Field::CurrY,
        Field::PredX,
        Field::PredY,
        Field::GoalX,
        Field::GoalY,
    ];

    /// Position of this field on the wire (0..=5).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Field name as used in JSON and log output.
    pub fn name(self) -> &'static str {
        match self {
            Field::CurrX => "curr_x",
            Field::CurrY => "curr_y",
            Field::PredX => "pred_x",
            Field::PredY => "pred_y",
            Field::GoalX => "goal_x",
            Field::GoalY => "goal_y",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Current position, predicted position and goal of the transmitting node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    pub curr_x: f32,
    pub curr_y: f32,
    pub pred_x: f32,
    pub pred_y: f32,
    pub goal_x: f32,
    pub goal_y: f32,
}

impl Record {
    /// Build a record from values in wire order.
    pub fn from_array(values: [f32; FIELD_COUNT]) -> Self {
        let [curr_x, curr_y, pred_x, pred_y, goal_x, goal_y] = values;
        Self {
            curr_x,
            curr_y,
            pred_x,
            pred_y,
            goal_x,
            goal_y,
        }
    }

    /// Values in wire order.
    pub fn to_array(&self) -> [f32; FIELD_COUNT] {
        [
            self.curr_x,
            self.curr_y,
            self.pred_x,
            self.pred_y,
            self.goal_x,
            self.goal_y,
        ]
    }

    pub fn get(&self, field: Field) -> f32 {
        match field {
            Field::CurrX => self.curr_x,
            Field::CurrY => self.curr_y,
            Field::PredX => self.pred_x,
            Field::PredY => self.pred_y,
            Field::GoalX => self.goal_x,
            Field::GoalY => self.goal_y,
        }
    }

    pub fn set(&mut self, field: Field, value: f32) {
        let slot = match field {
            Field::CurrX => &mut self.curr_x,
            Field::CurrY => &mut self.curr_y,
            Field::PredX => &mut self.pred_x,
            Field::PredY => &mut self.pred_y,
            Field::GoalX => &mut self.goal_x,
            Field::GoalY => &mut self.goal_y,
        };
        *slot = value;
    }

    /// Bitwise equality of every field. Unlike `==`, NaN equals itself and
    /// `0.0` differs from `-0.0`.
    pub fn bit_eq(&self, other: &Record) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}
