//! Plan participants: listing, removal and coordinator hand-over.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use wv_core::role::{check_reassign, check_remove};
use wv_core::{Channel, Notifier, Role};
use wv_db::Participant;

use super::util::{acting_user, open_database, participant_plan, user_by_email};
use crate::Config;

#[derive(Debug, Args)]
pub struct UsersArgs {
    /// Plan ID.
    pub plan_id: String,
}

#[derive(Debug, Args)]
pub struct RemoveUserArgs {
    /// Plan ID.
    pub plan_id: String,
    /// Email of the participant to remove.
    pub email: String,
}

#[derive(Debug, Args)]
pub struct ReassignArgs {
    /// Plan ID.
    pub plan_id: String,
    /// Email of the VibePlanner who becomes coordinator.
    pub email: String,
}

pub fn users<W: Write>(writer: &mut W, args: &UsersArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let (plan, _) = participant_plan(&db, &args.plan_id, &user)?;

    let participants = db.list_participants(&plan.id)?;
    write!(writer, "{}", format_participants(&participants))?;
    Ok(())
}

pub fn remove<W: Write>(writer: &mut W, args: &RemoveUserArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let caller = acting_user(&db, config)?;
    let (plan, caller_role) = participant_plan(&db, &args.plan_id, &caller)?;

    let target = user_by_email(&db, &args.email)?;
    let target_role = db
        .participant_role(&plan.id, &target.id)?
        .with_context(|| format!("{} is not a participant of this plan", target.email))?;
    check_remove(caller_role, target_role, target.id == caller.id)?;

    db.remove_participant(&plan.id, &target.id)?;
    tracing::info!(plan_id = %plan.id, user_id = %target.id, "participant removed");

    db.notify(
        &[target.id.clone()],
        &format!(
            "You've been removed from \"{}\" by {}.",
            plan.name,
            caller.full_name()
        ),
        Channel::Email,
    );
    db.notify(
        &[caller.id.clone()],
        &format!("Removed {} from \"{}\".", target.full_name(), plan.name),
        Channel::Email,
    );
    writeln!(writer, "Removed {} from \"{}\"", target.full_name(), plan.name)?;
    Ok(())
}

pub fn reassign<W: Write>(writer: &mut W, args: &ReassignArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let caller = acting_user(&db, config)?;
    let (plan, caller_role) = participant_plan(&db, &args.plan_id, &caller)?;

    let target = user_by_email(&db, &args.email)?;
    let target_role = db
        .participant_role(&plan.id, &target.id)?
        .with_context(|| format!("{} is not a participant of this plan", target.email))?;
    check_reassign(caller_role, target_role)?;

    db.reassign_coordinator(&plan.id, &caller.id, &target.id)?;
    tracing::info!(plan_id = %plan.id, from = %caller.id, to = %target.id, "coordinator reassigned");

    let participants = db.participant_ids(&plan.id)?;
    db.notify(
        &participants,
        &format!(
            "{} is now the VibeCoordinator of \"{}\".",
            target.full_name(),
            plan.name
        ),
        Channel::Email,
    );
    writeln!(
        writer,
        "{} is now the VibeCoordinator; you are a VibePlanner",
        target.full_name()
    )?;
    Ok(())
}

pub fn format_participants(participants: &[Participant]) -> String {
    let mut output = String::new();
    let mut current: Option<Role> = None;
    for participant in participants {
        if current != Some(participant.role) {
            let _ = writeln!(output, "{}", participant.role);
            current = Some(participant.role);
        }
        let _ = writeln!(
            output,
            "  {} <{}>",
            participant.user.full_name(),
            participant.user.email
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::commands::test_support::Fixture;

    #[test]
    fn users_groups_by_role() {
        let fixture = Fixture::new();
        let plan = fixture.trip();
        let bea = fixture.add_user("Bea", "bea@example.com");
        let cam = fixture.add_user("Cam", "cam@example.com");
        fixture.join(&plan, &cam, Role::Wanderer);
        fixture.join(&plan, &bea, Role::VibePlanner);
        let mut output = Vec::new();

        users(&mut output, &UsersArgs { plan_id: plan.id.to_string() }, &fixture.config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        VibeCoordinator
          Ana Lima <ana@example.com>
        VibePlanner
          Bea Test <bea@example.com>
        Wanderer
          Cam Test <cam@example.com>
        ");
    }

    #[test]
    fn planner_removes_wanderer() {
        let fixture = Fixture::new();
        let plan = fixture.trip();
        let bea = fixture.add_user("Bea", "bea@example.com");
        let cam = fixture.add_user("Cam", "cam@example.com");
        fixture.join(&plan, &bea, Role::VibePlanner);
        fixture.join(&plan, &cam, Role::Wanderer);
        let args = RemoveUserArgs {
            plan_id: plan.id.to_string(),
            email: "cam@example.com".to_string(),
        };
        let mut output = Vec::new();

        remove(&mut output, &args, &fixture.acting_as("bea@example.com")).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r#"Removed Cam Test from "London calling""#);
        let db = fixture.db();
        assert_eq!(db.participant_role(&plan.id, &cam.id).unwrap(), None);
        let inbox = db.list_notifications(&cam.id).unwrap();
        assert_eq!(
            inbox[0].message,
            "You've been removed from \"London calling\" by Bea Test."
        );
    }

    #[test]
    fn planner_cannot_remove_planner() {
        let fixture = Fixture::new();
        let plan = fixture.trip();
        let bea = fixture.add_user("Bea", "bea@example.com");
        let dan = fixture.add_user("Dan", "dan@example.com");
        fixture.join(&plan, &bea, Role::VibePlanner);
        fixture.join(&plan, &dan, Role::VibePlanner);
        let args = RemoveUserArgs {
            plan_id: plan.id.to_string(),
            email: "dan@example.com".to_string(),
        };
        let mut output = Vec::new();

        let err = remove(&mut output, &args, &fixture.acting_as("bea@example.com")).unwrap_err();
        assert_eq!(err.to_string(), "VibePlanners can only remove Wanderers");
    }

    #[test]
    fn coordinator_cannot_remove_self() {
        let fixture = Fixture::new();
        let plan = fixture.trip();
        let args = RemoveUserArgs {
            plan_id: plan.id.to_string(),
            email: "ana@example.com".to_string(),
        };
        let mut output = Vec::new();

        let err = remove(&mut output, &args, &fixture.config).unwrap_err();
        assert_eq!(err.to_string(), "cannot remove yourself");
    }

    #[test]
    fn reassign_hands_over_coordinator_role() {
        let fixture = Fixture::new();
        let plan = fixture.trip();
        let bea = fixture.add_user("Bea", "bea@example.com");
        fixture.join(&plan, &bea, Role::VibePlanner);
        let args = ReassignArgs {
            plan_id: plan.id.to_string(),
            email: "bea@example.com".to_string(),
        };
        let mut output = Vec::new();

        reassign(&mut output, &args, &fixture.config).unwrap();

        let db = fixture.db();
        assert_eq!(
            db.participant_role(&plan.id, &bea.id).unwrap(),
            Some(Role::VibeCoordinator)
        );
        assert_eq!(
            db.participant_role(&plan.id, &fixture.user.id).unwrap(),
            Some(Role::VibePlanner)
        );
        assert_eq!(db.find_plan(&plan.id).unwrap().unwrap().owner_id, bea.id);
        assert_eq!(db.list_notifications(&bea.id).unwrap().len(), 1);
    }

    #[test]
    fn reassign_requires_planner_target() {
        let fixture = Fixture::new();
        let plan = fixture.trip();
        let cam = fixture.add_user("Cam", "cam@example.com");
        fixture.join(&plan, &cam, Role::Wanderer);
        let args = ReassignArgs {
            plan_id: plan.id.to_string(),
            email: "cam@example.com".to_string(),
        };
        let mut output = Vec::new();

        let err = reassign(&mut output, &args, &fixture.config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "the new VibeCoordinator must currently be a VibePlanner"
        );
    }
}
