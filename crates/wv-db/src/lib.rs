//! Storage layer for the WanderVibe planner.
//!
//! Provides persistence for users, plans, participants, events, invitations
//! and the notification outbox using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization. Each CLI invocation opens
//! its own connection.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 format with millisecond precision
//! (e.g., `2025-10-11T03:00:00.000Z`), so lexicographic ordering matches
//! chronological ordering.
//!
//! ## Derived Data
//!
//! Day numbers are never stored; they are recomputed by
//! [`wv_core::compute_itinerary`] on every read. Plan start/end dates are
//! stored and may be rewritten by the date rollup (last write wins).

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use uuid::Uuid;

use wv_core::{
    Channel, Event, EventDraft, EventId, EventType, Invitation, InvitationId, InvitationStatus,
    NotificationPreferences, Notifier, Plan, PlanDatePatch, PlanDraft, PlanId, PlanStore,
    ResourceLinks, Role, User, UserId, ValidationError,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Input failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A user with this email already exists.
    #[error("a user with email {0} already exists")]
    DuplicateEmail(String),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {record_id}: {timestamp}")]
    TimestampParse {
        record_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row no longer maps onto the domain model.
    #[error("invalid stored data for {record_id}: {message}")]
    InvalidRecord { record_id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A plan member together with their role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user: User,
    pub role: Role,
}

/// A notification stored in the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub channel: String,
    pub message: String,
    pub created_at: String,
}

const USER_COLUMNS: &str =
    "u.id, u.first_name, u.last_name, u.email, u.notify_email, u.notify_sms, u.created_at";

const PLAN_COLUMNS: &str = "p.id, p.type, p.name, p.destination, p.location, p.time_zone, \
     p.start_date, p.end_date, p.auto_calculate_start_date, p.auto_calculate_end_date, \
     p.budget, p.planning_state, p.owner_id";

const EVENT_COLUMNS: &str = "e.id, e.plan_id, e.title, e.location, e.details, e.type, \
     e.custom_type, e.cost, e.cost_type, e.start_time, e.end_time, e.duration_minutes, \
     e.origin_time_zone, e.destination_time_zone, e.link_maps, e.link_uber, e.link_booking";

const INVITATION_COLUMNS: &str =
    "i.id, i.plan_id, i.user_id, i.invited_by, i.role, i.status, i.created_at";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                notify_email INTEGER NOT NULL DEFAULT 1,
                notify_sms INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- type: 'trip' or 'plan'
            -- start_date/end_date: explicit or rolled up from events
            CREATE TABLE IF NOT EXISTS plans (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                name TEXT NOT NULL,
                destination TEXT,
                location TEXT,
                time_zone TEXT,
                start_date TEXT,
                end_date TEXT,
                auto_calculate_start_date INTEGER NOT NULL DEFAULT 1,
                auto_calculate_end_date INTEGER NOT NULL DEFAULT 1,
                budget REAL NOT NULL DEFAULT 0,
                planning_state TEXT NOT NULL DEFAULT 'initial',
                owner_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_plans_owner ON plans(owner_id);

            CREATE TABLE IF NOT EXISTS plan_users (
                plan_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (plan_id, user_id),
                FOREIGN KEY (plan_id) REFERENCES plans(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_plan_users_user ON plan_users(user_id);

            -- Events: start_time < end_time is enforced before insert.
            -- Zone columns are only populated for flights.
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL,
                title TEXT NOT NULL,
                location TEXT,
                details TEXT,
                type TEXT NOT NULL,
                custom_type TEXT,
                cost REAL NOT NULL DEFAULT 0,
                cost_type TEXT NOT NULL DEFAULT 'estimated',
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration_minutes INTEGER,
                origin_time_zone TEXT,
                destination_time_zone TEXT,
                link_maps TEXT,
                link_uber TEXT,
                link_booking TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (plan_id) REFERENCES plans(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_events_plan_time ON events(plan_id, start_time, end_time);

            CREATE TABLE IF NOT EXISTS invitations (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                invited_by TEXT NOT NULL,
                role TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                FOREIGN KEY (plan_id) REFERENCES plans(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (invited_by) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_invitations_lookup ON invitations(plan_id, user_id, status);

            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                channel TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at);
            ",
        )?;
        Ok(())
    }

    // ========== Users ==========

    /// Registers a user. Emails are normalized and must be unique.
    pub fn create_user(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<User, DbError> {
        let email = wv_core::user::normalize_email(email)?;
        if self.find_user_by_email(&email)?.is_some() {
            return Err(DbError::DuplicateEmail(email));
        }
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(ValidationError::Empty { field: "firstName" }.into());
        }

        let user = User {
            id: UserId::new(new_id())?,
            first_name: first_name.to_string(),
            last_name: last_name.trim().to_string(),
            email,
            notification_preferences: NotificationPreferences::default(),
            created_at: now_millis(),
        };
        self.conn.execute(
            "
            INSERT INTO users (id, first_name, last_name, email, notify_email, notify_sms, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                user.id.as_str(),
                user.first_name,
                user.last_name,
                user.email,
                user.notification_preferences.email,
                user.notification_preferences.sms,
                format_timestamp(user.created_at),
            ],
        )?;
        tracing::debug!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub fn find_user(&self, user_id: &UserId) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?");
        self.conn
            .query_row(&sql, [user_id.as_str()], UserRow::from_row)
            .optional()?
            .map(UserRow::into_user)
            .transpose()
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let email = email.trim().to_lowercase();
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = ?");
        self.conn
            .query_row(&sql, [email], UserRow::from_row)
            .optional()?
            .map(UserRow::into_user)
            .transpose()
    }

    // ========== Plans ==========

    /// Validates and stores a new plan; the owner joins as its `VibeCoordinator`.
    pub fn create_plan(&mut self, draft: PlanDraft, owner: &UserId) -> Result<Plan, DbError> {
        let plan = draft.validate(PlanId::new(new_id())?, owner.clone())?;
        let now = format_timestamp(now_millis());

        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO plans
            (id, type, name, destination, location, time_zone, start_date, end_date,
             auto_calculate_start_date, auto_calculate_end_date, budget, planning_state,
             owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                plan.id.as_str(),
                plan.kind.as_str(),
                plan.name,
                plan.destination,
                plan.location,
                plan.time_zone,
                plan.start_date.map(format_timestamp),
                plan.end_date.map(format_timestamp),
                plan.auto_calculate_start_date,
                plan.auto_calculate_end_date,
                plan.budget,
                plan.planning_state.as_str(),
                plan.owner_id.as_str(),
                now,
                now,
            ],
        )?;
        tx.execute(
            "INSERT INTO plan_users (plan_id, user_id, role, created_at) VALUES (?, ?, ?, ?)",
            params![
                plan.id.as_str(),
                owner.as_str(),
                Role::VibeCoordinator.as_str(),
                now
            ],
        )?;
        tx.commit()?;
        tracing::debug!(plan_id = %plan.id, "plan created");
        Ok(plan)
    }

    pub fn find_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>, DbError> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM plans p WHERE p.id = ?");
        self.conn
            .query_row(&sql, [plan_id.as_str()], PlanRow::from_row)
            .optional()?
            .map(PlanRow::into_plan)
            .transpose()
    }

    /// Lists plans the user owns or participates in.
    ///
    /// Ordered by start date, undated plans last, then by name.
    pub fn list_plans_for_user(&self, user_id: &UserId) -> Result<Vec<Plan>, DbError> {
        let sql = format!(
            "
            SELECT {PLAN_COLUMNS}
            FROM plans p
            WHERE p.owner_id = ?1
               OR p.id IN (SELECT plan_id FROM plan_users WHERE user_id = ?1)
            ORDER BY p.start_date IS NULL, p.start_date ASC, p.name ASC, p.id ASC
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id.as_str()], PlanRow::from_row)?;
        let mut plans = Vec::new();
        for row in rows {
            plans.push(row?.into_plan()?);
        }
        Ok(plans)
    }

    /// Writes the rolled-up dates. Returns `false` if the plan is gone.
    pub fn patch_plan_dates(
        &mut self,
        plan_id: &PlanId,
        patch: &PlanDatePatch,
    ) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "
            UPDATE plans SET
                start_date = COALESCE(?2, start_date),
                end_date = COALESCE(?3, end_date),
                updated_at = ?4
            WHERE id = ?1
            ",
            params![
                plan_id.as_str(),
                patch.start_date.map(format_timestamp),
                patch.end_date.map(format_timestamp),
                format_timestamp(now_millis()),
            ],
        )?;
        Ok(updated > 0)
    }

    // ========== Participants ==========

    /// Returns the user's role on the plan, if they participate.
    pub fn participant_role(
        &self,
        plan_id: &PlanId,
        user_id: &UserId,
    ) -> Result<Option<Role>, DbError> {
        let role: Option<String> = self
            .conn
            .query_row(
                "SELECT role FROM plan_users WHERE plan_id = ? AND user_id = ?",
                params![plan_id.as_str(), user_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        role.map(|role| parse_field(&role, plan_id.as_str(), "role"))
            .transpose()
    }

    /// Lists participants ordered by role then name.
    pub fn list_participants(&self, plan_id: &PlanId) -> Result<Vec<Participant>, DbError> {
        let sql = format!(
            "
            SELECT {USER_COLUMNS}, pu.role
            FROM plan_users pu
            JOIN users u ON u.id = pu.user_id
            WHERE pu.plan_id = ?
            ORDER BY CASE pu.role
                WHEN 'VibeCoordinator' THEN 0
                WHEN 'VibePlanner' THEN 1
                ELSE 2
            END, u.first_name ASC, u.last_name ASC, u.id ASC
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([plan_id.as_str()], |row| {
            Ok((UserRow::from_row(row)?, row.get::<_, String>(7)?))
        })?;
        let mut participants = Vec::new();
        for row in rows {
            let (user, role) = row?;
            let role = parse_field(&role, &user.id, "role")?;
            participants.push(Participant {
                user: user.into_user()?,
                role,
            });
        }
        Ok(participants)
    }

    /// IDs of everyone on the plan.
    pub fn participant_ids(&self, plan_id: &PlanId) -> Result<Vec<UserId>, DbError> {
        Ok(self
            .list_participants(plan_id)?
            .into_iter()
            .map(|p| p.user.id)
            .collect())
    }

    pub fn add_participant(
        &mut self,
        plan_id: &PlanId,
        user_id: &UserId,
        role: Role,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO plan_users (plan_id, user_id, role, created_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(plan_id, user_id) DO UPDATE SET role = excluded.role
            ",
            params![
                plan_id.as_str(),
                user_id.as_str(),
                role.as_str(),
                format_timestamp(now_millis())
            ],
        )?;
        Ok(())
    }

    /// Removes a participant. Returns `false` if they were not on the plan.
    pub fn remove_participant(
        &mut self,
        plan_id: &PlanId,
        user_id: &UserId,
    ) -> Result<bool, DbError> {
        let removed = self.conn.execute(
            "DELETE FROM plan_users WHERE plan_id = ? AND user_id = ?",
            params![plan_id.as_str(), user_id.as_str()],
        )?;
        Ok(removed > 0)
    }

    /// Swaps coordinator and planner roles and transfers plan ownership.
    pub fn reassign_coordinator(
        &mut self,
        plan_id: &PlanId,
        from: &UserId,
        to: &UserId,
    ) -> Result<(), DbError> {
        let now = format_timestamp(now_millis());
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE plan_users SET role = ? WHERE plan_id = ? AND user_id = ?",
            params![Role::VibePlanner.as_str(), plan_id.as_str(), from.as_str()],
        )?;
        tx.execute(
            "UPDATE plan_users SET role = ? WHERE plan_id = ? AND user_id = ?",
            params![Role::VibeCoordinator.as_str(), plan_id.as_str(), to.as_str()],
        )?;
        tx.execute(
            "UPDATE plans SET owner_id = ?, updated_at = ? WHERE id = ?",
            params![to.as_str(), now, plan_id.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ========== Events ==========

    /// Validates and stores a new event.
    pub fn create_event(&mut self, draft: EventDraft) -> Result<Event, DbError> {
        let event = draft.validate(EventId::new(new_id())?)?;
        let now = format_timestamp(now_millis());
        self.conn.execute(
            "
            INSERT INTO events
            (id, plan_id, title, location, details, type, custom_type, cost, cost_type,
             start_time, end_time, duration_minutes, origin_time_zone, destination_time_zone,
             link_maps, link_uber, link_booking, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                event.id.as_str(),
                event.plan_id.as_str(),
                event.title,
                event.location,
                event.details,
                event.kind.as_str(),
                event.custom_type,
                event.cost,
                event.cost_type.as_str(),
                format_timestamp(event.start_time),
                format_timestamp(event.end_time),
                event.duration_minutes,
                event.origin_time_zone,
                event.destination_time_zone,
                event.resource_links.maps,
                event.resource_links.uber,
                event.resource_links.booking,
                now,
                now,
            ],
        )?;
        tracing::debug!(event_id = %event.id, plan_id = %event.plan_id, "event created");
        Ok(event)
    }

    /// Overwrites an existing event. Returns `false` if it no longer exists.
    pub fn update_event(&mut self, event: &Event) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "
            UPDATE events SET
                title = ?2, location = ?3, details = ?4, type = ?5, custom_type = ?6,
                cost = ?7, cost_type = ?8, start_time = ?9, end_time = ?10,
                duration_minutes = ?11, origin_time_zone = ?12, destination_time_zone = ?13,
                link_maps = ?14, link_uber = ?15, link_booking = ?16, updated_at = ?17
            WHERE id = ?1
            ",
            params![
                event.id.as_str(),
                event.title,
                event.location,
                event.details,
                event.kind.as_str(),
                event.custom_type,
                event.cost,
                event.cost_type.as_str(),
                format_timestamp(event.start_time),
                format_timestamp(event.end_time),
                event.duration_minutes,
                event.origin_time_zone,
                event.destination_time_zone,
                event.resource_links.maps,
                event.resource_links.uber,
                event.resource_links.booking,
                format_timestamp(now_millis()),
            ],
        )?;
        Ok(updated > 0)
    }

    /// Deletes an event. Returns `false` if it did not exist.
    pub fn delete_event(&mut self, event_id: &EventId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM events WHERE id = ?", [event_id.as_str()])?;
        Ok(deleted > 0)
    }

    pub fn find_event(&self, event_id: &EventId) -> Result<Option<Event>, DbError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ?");
        self.conn
            .query_row(&sql, [event_id.as_str()], EventRow::from_row)
            .optional()?
            .map(EventRow::into_event)
            .transpose()
    }

    /// Lists a plan's events ordered by start time then ID.
    pub fn list_events_for_plan(&self, plan_id: &PlanId) -> Result<Vec<Event>, DbError> {
        let sql = format!(
            "
            SELECT {EVENT_COLUMNS}
            FROM events e
            WHERE e.plan_id = ?
            ORDER BY e.start_time ASC, e.id ASC
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([plan_id.as_str()], EventRow::from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }

    // ========== Invitations ==========

    /// Stores a pending invitation.
    pub fn create_invitation(
        &mut self,
        plan_id: &PlanId,
        invitee: &UserId,
        invited_by: &UserId,
        role: Role,
    ) -> Result<Invitation, DbError> {
        let invitation = Invitation {
            id: InvitationId::new(new_id())?,
            plan_id: plan_id.clone(),
            user_id: invitee.clone(),
            invited_by: invited_by.clone(),
            role,
            status: InvitationStatus::Pending,
            created_at: now_millis(),
        };
        self.conn.execute(
            "
            INSERT INTO invitations (id, plan_id, user_id, invited_by, role, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                invitation.id.as_str(),
                invitation.plan_id.as_str(),
                invitation.user_id.as_str(),
                invitation.invited_by.as_str(),
                invitation.role.as_str(),
                invitation.status.as_str(),
                format_timestamp(invitation.created_at),
            ],
        )?;
        Ok(invitation)
    }

    pub fn find_invitation(
        &self,
        invitation_id: &InvitationId,
    ) -> Result<Option<Invitation>, DbError> {
        let sql = format!("SELECT {INVITATION_COLUMNS} FROM invitations i WHERE i.id = ?");
        self.conn
            .query_row(&sql, [invitation_id.as_str()], InvitationRow::from_row)
            .optional()?
            .map(InvitationRow::into_invitation)
            .transpose()
    }

    /// Any invitation for this plan and invitee, whatever its status.
    pub fn find_invitation_for(
        &self,
        plan_id: &PlanId,
        user_id: &UserId,
    ) -> Result<Option<Invitation>, DbError> {
        let sql = format!(
            "
            SELECT {INVITATION_COLUMNS}
            FROM invitations i
            WHERE i.plan_id = ? AND i.user_id = ?
            ORDER BY i.created_at DESC
            LIMIT 1
            "
        );
        self.conn
            .query_row(
                &sql,
                params![plan_id.as_str(), user_id.as_str()],
                InvitationRow::from_row,
            )
            .optional()?
            .map(InvitationRow::into_invitation)
            .transpose()
    }

    /// Lists invitations addressed to the user, newest first.
    pub fn list_invitations_for_user(&self, user_id: &UserId) -> Result<Vec<Invitation>, DbError> {
        let sql = format!(
            "
            SELECT {INVITATION_COLUMNS}
            FROM invitations i
            WHERE i.user_id = ?
            ORDER BY i.created_at DESC, i.id ASC
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id.as_str()], InvitationRow::from_row)?;
        let mut invitations = Vec::new();
        for row in rows {
            invitations.push(row?.into_invitation()?);
        }
        Ok(invitations)
    }

    /// Persists an answered invitation; accepting also adds the participant.
    pub fn record_response(&mut self, invitation: &Invitation) -> Result<(), DbError> {
        let now = format_timestamp(now_millis());
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE invitations SET status = ? WHERE id = ?",
            params![invitation.status.as_str(), invitation.id.as_str()],
        )?;
        if invitation.status == InvitationStatus::Accepted {
            tx.execute(
                "
                INSERT INTO plan_users (plan_id, user_id, role, created_at) VALUES (?, ?, ?, ?)
                ON CONFLICT(plan_id, user_id) DO NOTHING
                ",
                params![
                    invitation.plan_id.as_str(),
                    invitation.user_id.as_str(),
                    invitation.role.as_str(),
                    now
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ========== Notifications ==========

    /// Lists a user's notifications, oldest first.
    pub fn list_notifications(&self, user_id: &UserId) -> Result<Vec<NotificationRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, user_id, channel, message, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map([user_id.as_str()], |row| {
            Ok(NotificationRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                channel: row.get(2)?,
                message: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }

    fn enqueue_notifications(
        &self,
        recipients: &[UserId],
        message: &str,
        channel: Channel,
    ) -> Result<usize, DbError> {
        let now = format_timestamp(now_millis());
        let mut stmt = self.conn.prepare(
            "INSERT INTO notifications (id, user_id, channel, message, created_at) VALUES (?, ?, ?, ?, ?)",
        )?;
        let mut queued = 0;
        for recipient in recipients {
            queued += stmt.execute(params![
                new_id(),
                recipient.as_str(),
                channel.as_str(),
                message,
                now
            ])?;
        }
        Ok(queued)
    }
}

impl PlanStore for Database {
    type Error = DbError;

    fn find_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>, DbError> {
        Self::find_plan(self, plan_id)
    }

    fn find_events_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Event>, DbError> {
        self.list_events_for_plan(plan_id)
    }

    fn patch_plan_dates(
        &mut self,
        plan_id: &PlanId,
        patch: &PlanDatePatch,
    ) -> Result<bool, DbError> {
        Self::patch_plan_dates(self, plan_id, patch)
    }
}

/// Queues notifications in the outbox table. Delivery is out of scope here.
impl Notifier for Database {
    fn notify(&self, recipients: &[UserId], message: &str, channel: Channel) {
        match self.enqueue_notifications(recipients, message, channel) {
            Ok(queued) => tracing::info!(queued, %channel, message, "notification queued"),
            Err(err) => tracing::warn!(error = %err, "failed to queue notification"),
        }
    }
}

// ========== Row Mapping ==========

struct UserRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    notify_email: bool,
    notify_sms: bool,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            notify_email: row.get(4)?,
            notify_sms: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_user(self) -> Result<User, DbError> {
        Ok(User {
            created_at: parse_timestamp(&self.created_at, &self.id)?,
            id: parse_id(self.id)?,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            notification_preferences: NotificationPreferences {
                email: self.notify_email,
                sms: self.notify_sms,
            },
        })
    }
}

struct PlanRow {
    id: String,
    kind: String,
    name: String,
    destination: Option<String>,
    location: Option<String>,
    time_zone: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    auto_calculate_start_date: bool,
    auto_calculate_end_date: bool,
    budget: f64,
    planning_state: String,
    owner_id: String,
}

impl PlanRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            name: row.get(2)?,
            destination: row.get(3)?,
            location: row.get(4)?,
            time_zone: row.get(5)?,
            start_date: row.get(6)?,
            end_date: row.get(7)?,
            auto_calculate_start_date: row.get(8)?,
            auto_calculate_end_date: row.get(9)?,
            budget: row.get(10)?,
            planning_state: row.get(11)?,
            owner_id: row.get(12)?,
        })
    }

    fn into_plan(self) -> Result<Plan, DbError> {
        let id = self.id.as_str();
        Ok(Plan {
            kind: parse_field(&self.kind, id, "type")?,
            start_date: parse_optional_timestamp(self.start_date.as_deref(), id)?,
            end_date: parse_optional_timestamp(self.end_date.as_deref(), id)?,
            planning_state: parse_field(&self.planning_state, id, "planning_state")?,
            owner_id: parse_id(self.owner_id)?,
            id: parse_id(self.id)?,
            name: self.name,
            destination: self.destination,
            location: self.location,
            time_zone: self.time_zone,
            auto_calculate_start_date: self.auto_calculate_start_date,
            auto_calculate_end_date: self.auto_calculate_end_date,
            budget: self.budget,
        })
    }
}

struct EventRow {
    id: String,
    plan_id: String,
    title: String,
    location: Option<String>,
    details: Option<String>,
    kind: String,
    custom_type: Option<String>,
    cost: f64,
    cost_type: String,
    start_time: String,
    end_time: String,
    duration_minutes: Option<i64>,
    origin_time_zone: Option<String>,
    destination_time_zone: Option<String>,
    links: ResourceLinks,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            plan_id: row.get(1)?,
            title: row.get(2)?,
            location: row.get(3)?,
            details: row.get(4)?,
            kind: row.get(5)?,
            custom_type: row.get(6)?,
            cost: row.get(7)?,
            cost_type: row.get(8)?,
            start_time: row.get(9)?,
            end_time: row.get(10)?,
            duration_minutes: row.get(11)?,
            origin_time_zone: row.get(12)?,
            destination_time_zone: row.get(13)?,
            links: ResourceLinks {
                maps: row.get(14)?,
                uber: row.get(15)?,
                booking: row.get(16)?,
            },
        })
    }

    fn into_event(self) -> Result<Event, DbError> {
        let id = self.id.as_str();
        Ok(Event {
            kind: parse_field::<EventType>(&self.kind, id, "type")?,
            cost_type: parse_field(&self.cost_type, id, "cost_type")?,
            start_time: parse_timestamp(&self.start_time, id)?,
            end_time: parse_timestamp(&self.end_time, id)?,
            plan_id: parse_id(self.plan_id)?,
            id: parse_id(self.id)?,
            title: self.title,
            location: self.location,
            details: self.details,
            custom_type: self.custom_type,
            cost: self.cost,
            duration_minutes: self.duration_minutes,
            origin_time_zone: self.origin_time_zone,
            destination_time_zone: self.destination_time_zone,
            resource_links: self.links,
        })
    }
}

struct InvitationRow {
    id: String,
    plan_id: String,
    user_id: String,
    invited_by: String,
    role: String,
    status: String,
    created_at: String,
}

impl InvitationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            plan_id: row.get(1)?,
            user_id: row.get(2)?,
            invited_by: row.get(3)?,
            role: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_invitation(self) -> Result<Invitation, DbError> {
        let id = self.id.as_str();
        Ok(Invitation {
            role: parse_field(&self.role, id, "role")?,
            status: parse_field(&self.status, id, "status")?,
            created_at: parse_timestamp(&self.created_at, id)?,
            plan_id: parse_id(self.plan_id)?,
            user_id: parse_id(self.user_id)?,
            invited_by: parse_id(self.invited_by)?,
            id: parse_id(self.id)?,
        })
    }
}

// ========== Helpers ==========

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time truncated to the millisecond precision used in storage.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

fn parse_id<T>(value: String) -> Result<T, DbError>
where
    T: TryFrom<String, Error = ValidationError>,
{
    Ok(T::try_from(value)?)
}

fn parse_field<T>(value: &str, record_id: &str, field: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|err: T::Err| DbError::InvalidRecord {
        record_id: record_id.to_string(),
        message: format!("{field}: {err}"),
    })
}

fn parse_timestamp(timestamp: &str, record_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            record_id: record_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn parse_optional_timestamp(
    timestamp: Option<&str>,
    record_id: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
    timestamp
        .map(|timestamp| parse_timestamp(timestamp, record_id))
        .transpose()
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
