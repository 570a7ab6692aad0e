//! Values exchanged between the experiment, the agent and the environment.

/// Generic numeric tuple underlying both observations and actions.
///
/// Element counts are derived from the sequences themselves. A logically
/// absent vector (no observation produced yet) is the [`Default`] value: it
/// has the same wire form as a vector with three empty sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbstractVector {
    /// Integer components, written as int32.
    pub ints: Vec<i32>,
    /// Real components, written as float64.
    pub reals: Vec<f64>,
    /// Single-byte character components.
    pub chars: Vec<u8>,
}

/// An [`AbstractVector`] produced by the environment.
pub type Observation = AbstractVector;

/// An [`AbstractVector`] produced by the agent.
pub type Action = AbstractVector;

impl AbstractVector {
    /// Build a vector from its three component sequences.
    pub fn new(ints: Vec<i32>, reals: Vec<f64>, chars: Vec<u8>) -> Self {
        AbstractVector { ints, reals, chars }
    }

    /// A vector carrying integers only.
    pub fn from_ints(ints: impl Into<Vec<i32>>) -> Self {
        AbstractVector {
            ints: ints.into(),
            ..Default::default()
        }
    }

    /// A vector carrying reals only.
    pub fn from_reals(reals: impl Into<Vec<f64>>) -> Self {
        AbstractVector {
            reals: reals.into(),
            ..Default::default()
        }
    }

    /// A vector carrying characters only.
    pub fn from_chars(chars: impl Into<Vec<u8>>) -> Self {
        AbstractVector {
            chars: chars.into(),
            ..Default::default()
        }
    }

    /// Number of integer components.
    pub fn int_count(&self) -> usize {
        self.ints.len()
    }

    /// Number of real components.
    pub fn real_count(&self) -> usize {
        self.reals.len()
    }

    /// Number of character components.
    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    /// True when all three sequences are empty.
    pub fn is_empty(&self) -> bool {
        self.ints.is_empty() && self.reals.is_empty() && self.chars.is_empty()
    }

    /// Exact number of bytes this vector occupies on the wire.
    ///
    /// Three int32 counts, then 4 bytes per int, 8 per real and 1 per char.
    pub fn wire_size(&self) -> usize {
        12 + 4 * self.ints.len() + 8 * self.reals.len() + self.chars.len()
    }
}

/// Outcome of one environment step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    /// Reward earned by the action.
    pub reward: f64,
    /// Observation after the action.
    pub observation: Observation,
    /// True when the episode is over.
    pub terminal: bool,
}

/// A full step pulled by the experiment in one round trip: the environment's
/// outcome plus the agent's next action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResultWithAction {
    /// Reward earned by the previous action.
    pub reward: f64,
    /// Observation after the previous action.
    pub observation: Observation,
    /// True when the episode is over.
    pub terminal: bool,
    /// Action the agent chose for `observation`.
    pub action: Action,
}

/// Initial observation of an episode and the agent's first action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartResult {
    /// First observation of the episode.
    pub observation: Observation,
    /// First action of the agent.
    pub action: Action,
}
