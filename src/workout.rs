use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a logged workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkoutType {
    Gym,
    Running,
    Weightlifting,
    Cycling,
    Swimming,
    Walking,
    Yoga,
    Cricket,
    Dance,
    #[serde(rename = "Martial Arts")]
    MartialArts,
}

pub const ALL_WORKOUT_TYPES: [WorkoutType; 10] = [
    WorkoutType::Gym,
    WorkoutType::Running,
    WorkoutType::Weightlifting,
    WorkoutType::Cycling,
    WorkoutType::Swimming,
    WorkoutType::Walking,
    WorkoutType::Yoga,
    WorkoutType::Cricket,
    WorkoutType::Dance,
    WorkoutType::MartialArts,
];

impl WorkoutType {
    pub fn label(self) -> &'static str {
        match self {
            WorkoutType::Gym => "Gym",
            WorkoutType::Running => "Running",
            WorkoutType::Weightlifting => "Weightlifting",
            WorkoutType::Cycling => "Cycling",
            WorkoutType::Swimming => "Swimming",
            WorkoutType::Walking => "Walking",
            WorkoutType::Yoga => "Yoga",
            WorkoutType::Cricket => "Cricket",
            WorkoutType::Dance => "Dance",
            WorkoutType::MartialArts => "Martial Arts",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded workout.
///
/// Entries carry no identifier; their position in the store is the only
/// thing that tells two identical entries apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEntry {
    pub user_name: String,
    pub workout_type: WorkoutType,
    pub workout_minutes: u32,
}

impl WorkoutEntry {
    pub fn new(user_name: impl Into<String>, workout_type: WorkoutType, workout_minutes: u32) -> Self {
        Self {
            user_name: user_name.into(),
            workout_type,
            workout_minutes,
        }
    }
}

/// Entries written to an empty store on first launch.
pub fn seed_entries() -> Vec<WorkoutEntry> {
    vec![
        WorkoutEntry::new("John Doe", WorkoutType::Running, 30),
        WorkoutEntry::new("John Doe", WorkoutType::Cycling, 45),
        WorkoutEntry::new("Jane Smith", WorkoutType::Swimming, 60),
        WorkoutEntry::new("Jane Smith", WorkoutType::Running, 20),
        WorkoutEntry::new("Mike Johnson", WorkoutType::Yoga, 50),
        WorkoutEntry::new("Mike Johnson", WorkoutType::Cycling, 40),
    ]
}

/// Number of table rows shown per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    Five,
    Ten,
    Twenty,
}

pub const ALL_PAGE_SIZES: [PageSize; 3] = [PageSize::Five, PageSize::Ten, PageSize::Twenty];

impl PageSize {
    pub fn get(self) -> usize {
        match self {
            PageSize::Five => 5,
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Five
    }
}

/// Values typed into the "add workout" form.
///
/// Minutes are kept as text so that the field can be empty or hold
/// a partial number while the user is typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutForm {
    pub user_name: String,
    pub workout_type: Option<WorkoutType>,
    pub workout_minutes: String,
}

impl WorkoutForm {
    /// Build an entry if every field holds an acceptable value.
    pub fn to_entry(&self) -> Option<WorkoutEntry> {
        let name = self.user_name.trim();
        if name.is_empty() {
            return None;
        }
        let workout_type = self.workout_type?;
        let minutes = self.workout_minutes.trim().parse::<u32>().ok()?;
        Some(WorkoutEntry::new(name, workout_type, minutes))
    }

    pub fn is_valid(&self) -> bool {
        self.to_entry().is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
