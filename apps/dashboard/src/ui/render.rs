//! Text rendering of the dashboard: stats header, filter bar, customer table
//! and page strip.

use std::fmt::Write as _;

use client_core::{
    pagination::{page_strip, total_pages},
    FilterState, LoadState, QuickFilter, SortDirection, TextFilter,
};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use shared::{
    domain::InteractionChannel,
    protocol::{CustomerSummary, LastInteractionInfo},
};

use crate::controller::events::{UiError, UiEvent};

const SORTABLE_COLUMNS: [(&str, Option<&str>); 5] = [
    ("Name", Some("first_name")),
    ("Company", Some("company__name")),
    ("Birthday", Some("date_of_birth")),
    ("Last interaction", None),
    ("Sales rep", None),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    Nothing,
    Status(String),
    Redraw,
}

pub struct DashboardView {
    filters: FilterState,
    load: LoadState,
    page_size: u32,
    table_width: Option<u16>,
    startup_error: Option<UiError>,
}

impl DashboardView {
    pub fn new(filters: FilterState, page_size: u32) -> Self {
        Self {
            filters,
            load: LoadState::default(),
            page_size,
            table_width: None,
            startup_error: None,
        }
    }

    /// Fixed table width; otherwise the terminal width is used when known.
    pub fn with_table_width(mut self, width: u16) -> Self {
        self.table_width = Some(width);
        self
    }

    pub fn apply(&mut self, event: UiEvent) -> ViewUpdate {
        match event {
            UiEvent::Info(message) => ViewUpdate::Status(message),
            UiEvent::FiltersChanged(filters) => {
                self.filters = filters;
                ViewUpdate::Nothing
            }
            UiEvent::Loaded(state) => {
                let new_generation = state.generation != self.load.generation;
                let changed = state != self.load;
                self.load = state;
                if self.load.loading {
                    if new_generation {
                        ViewUpdate::Status("Loading customers...".to_string())
                    } else {
                        ViewUpdate::Nothing
                    }
                } else if changed {
                    ViewUpdate::Redraw
                } else {
                    ViewUpdate::Nothing
                }
            }
            UiEvent::Error(err) => {
                self.startup_error = Some(err);
                ViewUpdate::Redraw
            }
        }
    }

    /// True once the current generation has either stats or an error to
    /// show next to its customer page.
    pub fn is_settled(&self) -> bool {
        self.startup_error.is_some()
            || (self.load.generation > 0
                && !self.load.loading
                && (self.load.stats.is_some() || self.load.error.is_some()))
    }

    pub fn startup_error(&self) -> Option<&UiError> {
        self.startup_error.as_ref()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "CRM Dashboard    Total customers: {}",
            format_count(self.load.total_count)
        );

        if let Some(stats) = &self.load.stats {
            let _ = writeln!(
                out,
                "Total customers: {} | Birthdays this week: {} | Birthdays this month: {}",
                format_count(stats.total_customers),
                stats.birthday_this_week,
                stats.birthday_this_month
            );
        }

        let _ = writeln!(out, "{}", self.filter_bar());
        out.push('\n');

        if self.load.loading {
            out.push_str("Loading customers...\n");
        } else {
            let _ = writeln!(out, "{}", self.table());
            if self.load.customers.is_empty() {
                out.push_str("No customers match the current filters\n");
            }
            let _ = writeln!(out, "{}", self.page_line());
        }

        if let Some(err) = &self.startup_error {
            let _ = writeln!(out, "! {}", err.summary());
        }
        if let Some(err) = &self.load.error {
            let _ = writeln!(out, "! {}", UiError::from_load_error(err).summary());
        }
        out
    }

    fn filter_bar(&self) -> String {
        let mut parts = vec![format!("search \"{}\"", self.filters.search)];
        for (label, key) in [
            ("name", TextFilter::Name),
            ("company", TextFilter::Company),
            ("rep", TextFilter::SalesRep),
        ] {
            if let Some(value) = self.filters.text_filter(key) {
                parts.push(format!("{label} \"{value}\""));
            }
        }
        for (label, filter) in [
            ("birthday this week", QuickFilter::BirthdayThisWeek),
            ("birthday this month", QuickFilter::BirthdayThisMonth),
        ] {
            let mark = if self.filters.is_active(filter) { 'x' } else { ' ' };
            parts.push(format!("[{mark}] {label}"));
        }
        parts.push(format!("ordering {}", self.filters.ordering));
        format!("Filters: {}", parts.join(" | "))
    }

    fn table(&self) -> Table {
        let header: Vec<Cell> = SORTABLE_COLUMNS
            .iter()
            .map(|(label, field)| {
                let text = match field.and_then(|field| self.filters.sort_direction_for(field)) {
                    Some(SortDirection::Ascending) => format!("{label} ↑"),
                    Some(SortDirection::Descending) => format!("{label} ↓"),
                    None => label.to_string(),
                };
                Cell::new(text).fg(Color::White)
            })
            .collect();

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header);
        if let Some(width) = self.table_width {
            table.set_width(width);
        }
        for customer in &self.load.customers {
            table.add_row(customer_row(customer));
        }
        table
    }

    fn page_line(&self) -> String {
        let pages = total_pages(self.load.total_count, self.page_size);
        let strip: Vec<String> = page_strip(pages, self.filters.page)
            .into_iter()
            .map(|page| match page {
                Some(page) if page == self.filters.page => format!("[{page}]"),
                Some(page) => page.to_string(),
                None => "…".to_string(),
            })
            .collect();
        let mut line = format!("Page {} of {pages}: {}", self.filters.page, strip.join(" "));
        if self.load.has_previous {
            line.push_str("  (prev)");
        }
        if self.load.has_next {
            line.push_str("  (next)");
        }
        line
    }
}

fn customer_row(customer: &CustomerSummary) -> Vec<Cell> {
    let last_interaction = match &customer.last_interaction_info {
        Some(info) => Cell::new(describe_interaction(info)),
        None => Cell::new("No interactions").fg(Color::DarkGrey),
    };
    let sales_rep = match &customer.sales_rep_name {
        Some(name) => Cell::new(name),
        None => Cell::new("Unassigned").fg(Color::DarkGrey),
    };
    vec![
        Cell::new(format!("{} <{}>", customer.full_name, customer.email)),
        Cell::new(&customer.company_name),
        Cell::new(&customer.birthday_formatted),
        last_interaction,
        sales_rep,
    ]
}

fn describe_interaction(info: &LastInteractionInfo) -> String {
    let glyph = match info.kind.channel() {
        InteractionChannel::Phone => "tel",
        InteractionChannel::Mail => "mail",
        InteractionChannel::Message => "msg",
    };
    format!("[{glyph}] {} ({})", info.time_ago, info.kind)
}

/// Groups thousands with commas: `1234567` becomes `1,234,567`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
