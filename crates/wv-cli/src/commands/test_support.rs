//! Fixtures shared by command tests.

use tempfile::TempDir;
use wv_core::{Plan, PlanDraft, PlanKind, Role, User};
use wv_db::Database;

use crate::Config;

/// A temporary database with one registered user acting.
pub struct Fixture {
    _temp: TempDir,
    pub config: Config,
    pub user: User,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let database_path = temp.path().join("wv.db");
        let mut db = Database::open(&database_path).unwrap();
        let user = db.create_user("Ana", "Lima", "ana@example.com").unwrap();
        Self {
            _temp: temp,
            config: Config {
                database_path,
                user: Some(user.email.clone()),
                default_time_zone: Some("Europe/London".to_string()),
            },
            user,
        }
    }

    pub fn db(&self) -> Database {
        Database::open(&self.config.database_path).unwrap()
    }

    /// Config acting as someone else.
    pub fn acting_as(&self, email: &str) -> Config {
        Config {
            user: Some(email.to_string()),
            ..self.config.clone()
        }
    }

    pub fn add_user(&self, first: &str, email: &str) -> User {
        self.db().create_user(first, "Test", email).unwrap()
    }

    /// A London trip owned by the acting user.
    pub fn trip(&self) -> Plan {
        let mut draft = PlanDraft::new(PlanKind::Trip, "London calling");
        draft.destination = Some("London".to_string());
        draft.time_zone = Some("Europe/London".to_string());
        self.db().create_plan(draft, &self.user.id).unwrap()
    }

    pub fn join(&self, plan: &Plan, user: &User, role: Role) {
        self.db().add_participant(&plan.id, &user.id, role).unwrap();
    }
}
