use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Profile returned by `/api/users/me`, login and registration.
///
/// The backend dumps more columns than these (admin grant bookkeeping,
/// nested highlights); unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub last_login: Option<NaiveDateTime>,
}

impl User {
    pub fn role(&self) -> &'static str {
        if self.is_admin {
            "Admin"
        } else {
            "Member"
        }
    }

    pub fn last_login_display(&self) -> String {
        match self.last_login {
            Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
            None => "Never".to_string(),
        }
    }
}
