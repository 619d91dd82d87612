//! Orchestration of user actions against the entry store and chart.

use crate::analysis;
use crate::plotting::{BarChartSpec, ChartRenderer};
use crate::store::{EntryStore, KeyValueStorage};
use crate::workout::{PageSize, WorkoutEntry, WorkoutForm, WorkoutType};

/// Current query, page and selection state of the tracker view.
///
/// Derived views such as the filtered list or the visible page are
/// recomputed from the store on every call instead of being cached.
pub struct ViewController<S, R> {
    store: EntryStore<S>,
    chart: R,
    pub form: WorkoutForm,
    search_term: String,
    filter_type: Option<WorkoutType>,
    page_size: PageSize,
    current_page: usize,
    selected_user: Option<String>,
}

impl<S: KeyValueStorage, R: ChartRenderer> ViewController<S, R> {
    pub fn new(store: EntryStore<S>, chart: R, page_size: PageSize) -> Self {
        Self {
            store,
            chart,
            form: WorkoutForm::default(),
            search_term: String::new(),
            filter_type: None,
            page_size,
            current_page: 1,
            selected_user: None,
        }
    }

    /// Add the workout described by the form.
    ///
    /// Returns the added entry, or `None` when the form is incomplete. On
    /// success the filters are re-applied, the submitting user is selected and
    /// the form is cleared.
    pub fn submit(&mut self) -> Option<WorkoutEntry> {
        let entry = self.form.to_entry()?;
        if let Err(e) = self.store.add(entry.clone()) {
            log::error!("Failed to persist workout entries: {e}");
        }
        log::info!("{}", analysis::format_added_message(&entry));
        self.apply_filters();
        self.select_user(&entry.user_name);
        self.form.reset();
        Some(entry)
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.apply_filters();
    }

    pub fn set_filter_type(&mut self, workout_type: Option<WorkoutType>) {
        self.filter_type = workout_type;
        self.apply_filters();
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.apply_filters();
    }

    /// Move `delta` pages forward or backward, staying within range.
    pub fn change_page(&mut self, delta: i64) {
        let target = (self.current_page as i64).saturating_add(delta).max(1);
        self.set_page(usize::try_from(target).unwrap_or(1));
    }

    /// Jump to `page`, clamped to `1..=total_pages` (page 1 when there are
    /// no pages at all).
    pub fn set_page(&mut self, page: usize) {
        let last = self.total_pages().max(1);
        self.current_page = page.clamp(1, last);
    }

    /// Select `user_name` and redraw the chart with their minutes per type.
    pub fn select_user(&mut self, user_name: &str) {
        self.selected_user = Some(user_name.to_owned());
        let aggregate = analysis::chart_aggregate(self.store.all(), user_name);
        self.chart.destroy();
        self.chart
            .render(BarChartSpec::minutes_by_type(user_name, &aggregate));
    }

    fn apply_filters(&mut self) {
        self.current_page = 1;
    }

    pub fn entries(&self) -> &[WorkoutEntry] {
        self.store.all()
    }

    pub fn filtered_entries(&self) -> Vec<&WorkoutEntry> {
        analysis::filter(self.store.all(), &self.search_term, self.filter_type)
    }

    /// Entries visible on the current page.
    pub fn page_entries(&self) -> Vec<&WorkoutEntry> {
        let filtered = self.filtered_entries();
        analysis::paginate(&filtered, self.current_page, self.page_size.get()).to_vec()
    }

    pub fn total_pages(&self) -> usize {
        analysis::total_pages(self.filtered_entries().len(), self.page_size.get())
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn unique_users(&self) -> Vec<String> {
        analysis::unique_users(self.store.all())
    }

    pub fn count_for_user(&self, user_name: &str) -> usize {
        analysis::count_for_user(self.store.all(), user_name)
    }

    pub fn total_minutes_for_user(&self, user_name: &str) -> u64 {
        analysis::total_minutes_for_user(self.store.all(), user_name)
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filter_type(&self) -> Option<WorkoutType> {
        self.filter_type
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn selected_user(&self) -> Option<&str> {
        self.selected_user.as_deref()
    }

    pub fn chart(&self) -> &R {
        &self.chart
    }
}
