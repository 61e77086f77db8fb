use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod call;
pub mod card;
pub mod health;
pub mod pull_list;
pub mod scoring;
pub mod session;
pub mod sse;
pub mod template;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn format_optional_time(time: Option<SystemTime>) -> Option<String> {
    time.map(format_system_time)
}
