//! Pure diet arithmetic: energy targets, daily balance, insights and streaks.

pub mod daily;
pub mod formulas;
pub mod insights;
pub mod streak;
pub mod workouts;
