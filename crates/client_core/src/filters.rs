//! Filter/query state for the customer list and the reducer that drives it.
//!
//! Every transition consumes the current [`FilterState`] and returns the next
//! one. Actions that change which customers match reset pagination to the
//! first page; ordering and paging moves keep the current position.

use std::fmt;

pub const DEFAULT_ORDERING_FIELD: &str = "first_name";
const DESCENDING_MARKER: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort field plus direction, rendered on the wire as `field` or `-field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingKey {
    field: String,
    direction: SortDirection,
}

impl OrderingKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Accepts any text verbatim; one leading marker flips the direction.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(DESCENDING_MARKER) {
            Some(field) => Self::descending(field),
            None => Self::ascending(raw),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Descending
    }

    fn toggled_for(&self, field: &str) -> Self {
        if self.field == field && self.direction == SortDirection::Ascending {
            Self::descending(field)
        } else {
            Self::ascending(field)
        }
    }
}

impl Default for OrderingKey {
    fn default() -> Self {
        Self::ascending(DEFAULT_ORDERING_FIELD)
    }
}

impl fmt::Display for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_descending() {
            write!(f, "{DESCENDING_MARKER}{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFilter {
    BirthdayThisWeek,
    BirthdayThisMonth,
}

impl QuickFilter {
    pub fn query_name(self) -> &'static str {
        match self {
            QuickFilter::BirthdayThisWeek => "birthday_this_week",
            QuickFilter::BirthdayThisMonth => "birthday_this_month",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFilter {
    Name,
    Company,
    SalesRep,
}

impl TextFilter {
    pub fn query_name(self) -> &'static str {
        match self {
            TextFilter::Name => "name",
            TextFilter::Company => "company",
            TextFilter::SalesRep => "sales_rep",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    SetSearchText(String),
    SetTextFilter {
        key: TextFilter,
        value: Option<String>,
    },
    ToggleQuickFilter(QuickFilter),
    SetSort(String),
    ClearFilters,
    SetPage(u32),
    NextPage,
    PreviousPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub sales_rep: Option<String>,
    pub birthday_this_week: bool,
    pub birthday_this_month: bool,
    pub ordering: OrderingKey,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            name: None,
            company: None,
            sales_rep: None,
            birthday_this_week: false,
            birthday_this_month: false,
            ordering: OrderingKey::default(),
            page: 1,
        }
    }
}

pub fn reduce(state: FilterState, action: FilterAction) -> FilterState {
    match action {
        FilterAction::SetSearchText(text) => state.set_search_text(text),
        FilterAction::SetTextFilter { key, value } => state.set_text_filter(key, value),
        FilterAction::ToggleQuickFilter(filter) => state.toggle_quick_filter(filter),
        FilterAction::SetSort(field) => state.set_sort(&field),
        FilterAction::ClearFilters => state.clear_filters(),
        FilterAction::SetPage(page) => state.set_page(page),
        FilterAction::NextPage => state.next_page(),
        FilterAction::PreviousPage => state.previous_page(),
    }
}

impl FilterState {
    pub fn set_search_text(self, text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            page: 1,
            ..self
        }
    }

    /// An empty value clears the filter.
    pub fn set_text_filter(mut self, key: TextFilter, value: Option<String>) -> Self {
        let value = value.filter(|text| !text.is_empty());
        match key {
            TextFilter::Name => self.name = value,
            TextFilter::Company => self.company = value,
            TextFilter::SalesRep => self.sales_rep = value,
        }
        self.page = 1;
        self
    }

    pub fn toggle_quick_filter(mut self, filter: QuickFilter) -> Self {
        match filter {
            QuickFilter::BirthdayThisWeek => self.birthday_this_week = !self.birthday_this_week,
            QuickFilter::BirthdayThisMonth => self.birthday_this_month = !self.birthday_this_month,
        }
        self.page = 1;
        self
    }

    /// Ascending on a new field, descending when the field is already the
    /// ascending key. Keeps the current page.
    pub fn set_sort(self, field: &str) -> Self {
        Self {
            ordering: self.ordering.toggled_for(field),
            ..self
        }
    }

    pub fn clear_filters(self) -> Self {
        Self::default()
    }

    pub fn set_page(self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn next_page(self) -> Self {
        let page = self.page.saturating_add(1);
        self.set_page(page)
    }

    pub fn previous_page(self) -> Self {
        let page = self.page.saturating_sub(1);
        self.set_page(page)
    }

    pub fn is_active(&self, filter: QuickFilter) -> bool {
        match filter {
            QuickFilter::BirthdayThisWeek => self.birthday_this_week,
            QuickFilter::BirthdayThisMonth => self.birthday_this_month,
        }
    }

    pub fn text_filter(&self, key: TextFilter) -> Option<&str> {
        match key {
            TextFilter::Name => self.name.as_deref(),
            TextFilter::Company => self.company.as_deref(),
            TextFilter::SalesRep => self.sales_rep.as_deref(),
        }
    }

    /// Direction of the active sort when `field` is the ordering field.
    pub fn sort_direction_for(&self, field: &str) -> Option<SortDirection> {
        (self.ordering.field() == field).then(|| self.ordering.direction())
    }

    /// Query parameters for the customer list endpoint. Quick filters are
    /// only sent when set; text is forwarded as-is.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("search", self.search.clone())];
        for key in [TextFilter::Name, TextFilter::Company, TextFilter::SalesRep] {
            if let Some(value) = self.text_filter(key) {
                query.push((key.query_name(), value.to_string()));
            }
        }
        for filter in [QuickFilter::BirthdayThisWeek, QuickFilter::BirthdayThisMonth] {
            if self.is_active(filter) {
                query.push((filter.query_name(), "true".to_string()));
            }
        }
        query.push(("ordering", self.ordering.to_string()));
        query.push(("page", self.page.to_string()));
        query
    }
}

#[cfg(test)]
#[path = "tests/filters_tests.rs"]
mod tests;
