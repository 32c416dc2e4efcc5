use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerId, InteractionType};

/// Paginated envelope wrapping every list endpoint of the CRM API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastInteractionInfo {
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub time_ago: String,
    pub date: DateTime<Utc>,
}

/// Read-only projection of a customer as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub full_name: String,
    pub email: String,
    pub birthday_formatted: String,
    pub company_name: String,
    #[serde(default)]
    pub sales_rep_name: Option<String>,
    #[serde(default)]
    pub last_interaction_info: Option<LastInteractionInfo>,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStats {
    pub total_customers: u64,
    pub birthday_this_week: u64,
    pub birthday_this_month: u64,
}
