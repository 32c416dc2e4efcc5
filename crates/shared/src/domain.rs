use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(CustomerId);

/// Kind of contact recorded between a sales representative and a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    Call,
    Email,
    #[serde(rename = "SMS")]
    Sms,
    Meeting,
    Facebook,
    #[serde(rename = "LinkedIn")]
    LinkedIn,
    #[serde(rename = "WhatsApp")]
    WhatsApp,
    Phone,
    #[serde(other)]
    Other,
}

/// Coarse grouping used when rendering the last interaction of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionChannel {
    Phone,
    Mail,
    Message,
}

impl InteractionType {
    pub fn channel(self) -> InteractionChannel {
        match self {
            InteractionType::Call | InteractionType::Phone => InteractionChannel::Phone,
            InteractionType::Email => InteractionChannel::Mail,
            _ => InteractionChannel::Message,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InteractionType::Call => "Call",
            InteractionType::Email => "Email",
            InteractionType::Sms => "SMS",
            InteractionType::Meeting => "Meeting",
            InteractionType::Facebook => "Facebook",
            InteractionType::LinkedIn => "LinkedIn",
            InteractionType::WhatsApp => "WhatsApp",
            InteractionType::Phone => "Phone",
            InteractionType::Other => "Other",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
