//! The plugin-owned credential record.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

use crate::ids::Username;

/// One row of the authentication plugin's `authme` table.
///
/// The column set is an external compatibility contract: the names, the
/// epoch-millisecond bigint timestamps, and the 0/1 smallint flags are fixed
/// by the plugin and must not be reshaped. This service inserts a row exactly
/// once, at registration, and only ever reads it afterwards; position,
/// `lastlogin`, and the session flags belong to the plugin.
#[derive(Clone)]
pub struct CredentialRecord {
    /// Unique account name, the lookup key.
    pub username: Username,

    /// Display capitalization as the player typed it.
    pub realname: String,

    /// Password hash in PHC string format.
    pub password: String,

    /// Last known client address.
    pub ip: Option<String>,

    /// Last in-game login, epoch milliseconds. Plugin-owned.
    pub lastlogin: Option<i64>,

    /// Logout position. Plugin-owned.
    pub x: f64,
    /// Logout position. Plugin-owned.
    pub y: f64,
    /// Logout position. Plugin-owned.
    pub z: f64,

    /// World of the logout position. Plugin-owned.
    pub world: String,

    /// Registration time, epoch milliseconds. Set once by this service.
    pub regdate: i64,

    /// Address the registration came from.
    pub regip: Option<String>,

    /// Logout view angle. Plugin-owned.
    pub yaw: Option<f32>,
    /// Logout view angle. Plugin-owned.
    pub pitch: Option<f32>,

    /// Contact address captured at registration.
    pub email: Option<String>,

    /// 0/1 flag: currently authenticated in game. Plugin-owned.
    pub is_logged: i16,

    /// 0/1 flag: has a persisted in-game session. Plugin-owned.
    pub has_session: i16,
}

impl CredentialRecord {
    /// Build the row inserted at registration.
    ///
    /// Plugin-owned fields are left at the values the plugin expects for a
    /// never-seen player: origin position in `world`, no login yet, both
    /// session flags cleared.
    #[must_use]
    pub fn new(
        username: Username,
        password_hash: String,
        email: Option<String>,
        regip: Option<String>,
    ) -> Self {
        Self {
            realname: username.as_str().to_owned(),
            username,
            password: password_hash,
            ip: regip.clone(),
            lastlogin: None,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            world: "world".to_owned(),
            regdate: Utc::now().timestamp_millis(),
            regip,
            yaw: None,
            pitch: None,
            email,
            is_logged: 0,
            has_session: 0,
        }
    }

    /// Registration time as a UTC timestamp, if the stored millis are sane.
    #[must_use]
    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.regdate).single()
    }

    /// Last in-game login as a UTC timestamp, if the plugin recorded one.
    #[must_use]
    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.lastlogin
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

// The password hash stays out of log output.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("realname", &self.realname)
            .field("password", &"<redacted>")
            .field("regdate", &self.regdate)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
