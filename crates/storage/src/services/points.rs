use std::str::FromStr;
use std::sync::Arc;

/// Maps a finishing position to the points it earns.
///
/// `rank` is 1-based within one race; `field_size` is the number of ranked
/// rows in that race. Any `Fn(u32, u32) -> i32` closure is a formula too.
pub trait PointsFormula: Send + Sync {
    fn points(&self, rank: u32, field_size: u32) -> i32;
}

impl<F> PointsFormula for F
where
    F: Fn(u32, u32) -> i32 + Send + Sync,
{
    fn points(&self, rank: u32, field_size: u32) -> i32 {
        self(rank, field_size)
    }
}

/// `winner` points for first place, `step` less for each place behind,
/// never below `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearPoints {
    pub winner: i32,
    pub step: i32,
    pub floor: i32,
}

impl Default for LinearPoints {
    fn default() -> Self {
        Self {
            winner: 100,
            step: 1,
            floor: 1,
        }
    }
}

impl PointsFormula for LinearPoints {
    fn points(&self, rank: u32, _field_size: u32) -> i32 {
        let behind = i32::try_from(rank.saturating_sub(1)).unwrap_or(i32::MAX);
        self.winner
            .saturating_sub(self.step.saturating_mul(behind))
            .max(self.floor)
    }
}

/// One point per competitor beaten, plus one: last place always scores 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSizePoints;

impl PointsFormula for FieldSizePoints {
    fn points(&self, rank: u32, field_size: u32) -> i32 {
        let beaten = field_size.saturating_sub(rank);
        i32::try_from(beaten).unwrap_or(i32::MAX).saturating_add(1)
    }
}

/// Formulas selectable by name from configuration: `linear` or `field-size`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormulaChoice {
    #[default]
    Linear,
    FieldSize,
}

impl FormulaChoice {
    /// `linear` carries the settings used when the linear formula is chosen.
    pub fn build(self, linear: LinearPoints) -> Arc<dyn PointsFormula> {
        match self {
            FormulaChoice::Linear => Arc::new(linear),
            FormulaChoice::FieldSize => Arc::new(FieldSizePoints),
        }
    }
}

impl FromStr for FormulaChoice {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(FormulaChoice::Linear),
            "field-size" | "field_size" => Ok(FormulaChoice::FieldSize),
            other => Err(format!(
                "unknown points formula '{}', expected linear or field-size",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_points_default() {
        let formula = LinearPoints::default();
        assert_eq!(formula.points(1, 10), 100);
        assert_eq!(formula.points(2, 10), 99);
        assert_eq!(formula.points(100, 150), 1);
        assert_eq!(formula.points(500, 500), 1);
    }

    #[test]
    fn test_linear_points_floor() {
        let formula = LinearPoints {
            winner: 50,
            step: 10,
            floor: 5,
        };
        assert_eq!(formula.points(3, 10), 30);
        assert_eq!(formula.points(6, 10), 5);
        assert_eq!(formula.points(u32::MAX, 10), 5);
    }

    #[test]
    fn test_field_size_points() {
        assert_eq!(FieldSizePoints.points(1, 8), 8);
        assert_eq!(FieldSizePoints.points(8, 8), 1);
    }

    #[test]
    fn test_closure_is_a_formula() {
        let podium = |rank: u32, _: u32| match rank {
            1 => 25,
            2 => 18,
            3 => 15,
            _ => 0,
        };
        assert_eq!(podium.points(2, 20), 18);
        assert_eq!(podium.points(4, 20), 0);
    }

    #[test]
    fn test_formula_choice_from_name() {
        assert_eq!("linear".parse::<FormulaChoice>(), Ok(FormulaChoice::Linear));
        assert_eq!(" Field-Size ".parse::<FormulaChoice>(), Ok(FormulaChoice::FieldSize));
        assert!("podium".parse::<FormulaChoice>().is_err());
    }

    #[test]
    fn test_formula_choice_builds_formula() {
        let linear = LinearPoints {
            winner: 10,
            step: 2,
            floor: 1,
        };
        assert_eq!(FormulaChoice::Linear.build(linear).points(2, 5), 8);
        assert_eq!(FormulaChoice::FieldSize.build(linear).points(2, 5), 4);
    }
}
