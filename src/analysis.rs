// Filtering, pagination and per-user aggregation of workout entries
use crate::workout::{WorkoutEntry, WorkoutType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Workout count and total minutes for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_name: String,
    pub workouts: usize,
    pub total_minutes: u64,
}

/// Select the entries matching a name search and an optional workout type.
///
/// The name match is a case-insensitive substring test, so an empty
/// `search_term` matches everyone. Entries keep their original order.
pub fn filter<'a>(
    entries: &'a [WorkoutEntry],
    search_term: &str,
    workout_type: Option<WorkoutType>,
) -> Vec<&'a WorkoutEntry> {
    let needle = search_term.to_lowercase();
    entries
        .iter()
        .filter(|e| e.user_name.to_lowercase().contains(&needle))
        .filter(|e| workout_type.map_or(true, |t| e.workout_type == t))
        .collect()
}

/// Return the 1-based `page` of `items`.
///
/// Pages outside the available range, page 0 and a page size of 0 all
/// yield an empty slice.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let Some(start) = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
    else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `len` items. An empty list has zero pages.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// User names in the order they first appear.
pub fn unique_users(entries: &[WorkoutEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut users = Vec::new();
    for e in entries {
        if seen.insert(e.user_name.as_str()) {
            users.push(e.user_name.clone());
        }
    }
    users
}

pub fn count_for_user(entries: &[WorkoutEntry], user_name: &str) -> usize {
    entries.iter().filter(|e| e.user_name == user_name).count()
}

pub fn total_minutes_for_user(entries: &[WorkoutEntry], user_name: &str) -> u64 {
    entries
        .iter()
        .filter(|e| e.user_name == user_name)
        .map(|e| u64::from(e.workout_minutes))
        .sum()
}

/// Sum a user's minutes per workout type.
///
/// Types appear in the order the user first logged them.
pub fn chart_aggregate(entries: &[WorkoutEntry], user_name: &str) -> Vec<(WorkoutType, u64)> {
    let mut totals: Vec<(WorkoutType, u64)> = Vec::new();
    for e in entries.iter().filter(|e| e.user_name == user_name) {
        let minutes = u64::from(e.workout_minutes);
        match totals.iter_mut().find(|(t, _)| *t == e.workout_type) {
            Some((_, total)) => *total += minutes,
            None => totals.push((e.workout_type, minutes)),
        }
    }
    totals
}

/// One summary row per user, in first-seen order.
pub fn user_summaries(entries: &[WorkoutEntry]) -> Vec<UserSummary> {
    unique_users(entries)
        .into_iter()
        .map(|user_name| UserSummary {
            workouts: count_for_user(entries, &user_name),
            total_minutes: total_minutes_for_user(entries, &user_name),
            user_name,
        })
        .collect()
}

/// Format a status line after a workout has been added.
pub fn format_added_message(entry: &WorkoutEntry) -> String {
    format!(
        "Added {} min of {} for {}",
        entry.workout_minutes, entry.workout_type, entry.user_name
    )
}
