use std::fmt;
use std::str::FromStr;

/// Grid layouts offered by the viewer, as rows x columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    #[default]
    OneByOne,
    TwoByTwo,
    ThreeByThree,
    FourByThree,
}

impl Layout {
    pub const ALL: [Layout; 4] = [
        Layout::OneByOne,
        Layout::TwoByTwo,
        Layout::ThreeByThree,
        Layout::FourByThree,
    ];

    pub fn rows(self) -> usize {
        match self {
            Layout::OneByOne => 1,
            Layout::TwoByTwo => 2,
            Layout::ThreeByThree => 3,
            Layout::FourByThree => 4,
        }
    }

    pub fn cols(self) -> usize {
        match self {
            Layout::OneByOne => 1,
            Layout::TwoByTwo => 2,
            Layout::ThreeByThree | Layout::FourByThree => 3,
        }
    }

    /// Number of viewport slots (rows * cols)
    pub fn capacity(self) -> usize {
        self.rows() * self.cols()
    }

    /// Route token, e.g. `"4x3"`
    pub fn token(self) -> &'static str {
        match self {
            Layout::OneByOne => "1x1",
            Layout::TwoByTwo => "2x2",
            Layout::ThreeByThree => "3x3",
            Layout::FourByThree => "4x3",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayout(pub String);

impl fmt::Display for UnknownLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown layout {:?}", self.0)
    }
}

impl std::error::Error for UnknownLayout {}

impl FromStr for Layout {
    type Err = UnknownLayout;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Layout::ALL
            .into_iter()
            .find(|layout| layout.token() == token)
            .ok_or_else(|| UnknownLayout(token.to_string()))
    }
}

/// What to do with series that do not fit into the active layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Keep them in the series list without telling anyone.
    #[default]
    Hide,
    /// Keep them hidden, but log a warning and expose a notice in the snapshot.
    Warn,
}

/// Initialization state of the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    /// Terminal: there is no retry path.
    Failed,
}

impl Readiness {
    pub fn is_ready(self) -> bool {
        matches!(self, Readiness::Ready)
    }
}
