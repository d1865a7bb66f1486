use crate::enums::text_enum;

text_enum! {
    pub enum WorkoutType {
        Cardio => "cardio",
        Strength => "strength",
        Flexibility => "flexibility",
        Hiit => "hiit",
        Other => "other",
    }
}

text_enum! {
    pub enum Intensity {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl WorkoutType {
    /// kcal per minute at low/medium/high intensity.
    fn burn_rates(&self) -> [f64; 3] {
        match self {
            WorkoutType::Cardio => [5.0, 7.0, 10.0],
            WorkoutType::Strength => [3.0, 5.0, 8.0],
            WorkoutType::Flexibility => [2.0, 4.0, 6.0],
            WorkoutType::Hiit => [8.0, 12.0, 16.0],
            WorkoutType::Other => [4.0, 6.0, 8.0],
        }
    }

    pub fn kcal_per_minute(&self, intensity: Intensity) -> f64 {
        let [low, medium, high] = self.burn_rates();
        match intensity {
            Intensity::Low => low,
            Intensity::Medium => medium,
            Intensity::High => high,
        }
    }
}

pub fn estimate_calories_burned(kind: WorkoutType, intensity: Intensity, duration_min: u32) -> i32 {
    (kind.kcal_per_minute(intensity) * f64::from(duration_min)).round() as i32
}

/// User-entered value when positive, otherwise the table estimate.
pub fn resolve_calories_burned(
    entered: Option<i32>,
    kind: WorkoutType,
    intensity: Intensity,
    duration_min: u32,
) -> i32 {
    match entered {
        Some(kcal) if kcal > 0 => kcal,
        _ => estimate_calories_burned(kind, intensity, duration_min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_from_table() {
        assert_eq!(estimate_calories_burned(WorkoutType::Cardio, Intensity::Medium, 30), 210);
        assert_eq!(estimate_calories_burned(WorkoutType::Hiit, Intensity::High, 20), 320);
        assert_eq!(estimate_calories_burned(WorkoutType::Flexibility, Intensity::Low, 45), 90);
        assert_eq!(estimate_calories_burned(WorkoutType::Strength, Intensity::Low, 0), 0);
    }

    #[test]
    fn entered_value_wins_when_positive() {
        assert_eq!(
            resolve_calories_burned(Some(400), WorkoutType::Other, Intensity::Low, 10),
            400
        );
        assert_eq!(
            resolve_calories_burned(Some(0), WorkoutType::Other, Intensity::Low, 10),
            40
        );
        assert_eq!(
            resolve_calories_burned(None, WorkoutType::Other, Intensity::High, 10),
            80
        );
    }
}
