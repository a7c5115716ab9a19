use serde::{Deserialize, Serialize};

/// Points attached to a result row.
///
/// A row starts out `Unset` and only the recalculator moves it to `Computed`.
/// Persisted as a nullable integer column, so `Computed(0)` and `Unset` stay
/// distinct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<i32>", into = "Option<i32>")]
pub enum Points {
    #[default]
    Unset,
    Computed(i32),
}

impl Points {
    pub fn is_unset(&self) -> bool {
        matches!(self, Points::Unset)
    }

    pub fn value(&self) -> Option<i32> {
        match self {
            Points::Unset => None,
            Points::Computed(value) => Some(*value),
        }
    }
}

impl From<Option<i32>> for Points {
    fn from(value: Option<i32>) -> Self {
        value.map_or(Points::Unset, Points::Computed)
    }
}

impl From<Points> for Option<i32> {
    fn from(points: Points) -> Self {
        points.value()
    }
}
