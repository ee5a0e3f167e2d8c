//! Invitations: sending, answering and listing.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;

use wv_core::role::check_invite;
use wv_core::{Channel, InvitationId, InvitationStatus, Notifier, Role};

use super::util::{acting_user, open_database, participant_plan, user_by_email};
use crate::Config;

#[derive(Debug, Args)]
pub struct InviteArgs {
    /// Plan ID.
    pub plan_id: String,
    /// Email of a registered user.
    pub email: String,
    /// `VibePlanner` (or `planner`) or `Wanderer` (or `wanderer`).
    pub role: Role,
}

#[derive(Debug, Args)]
pub struct RespondArgs {
    /// Invitation ID.
    pub invitation_id: String,
    /// `accept` or `reject`.
    pub response: InvitationStatus,
}

pub fn invite<W: Write>(writer: &mut W, args: &InviteArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let inviter = acting_user(&db, config)?;
    let (plan, inviter_role) = participant_plan(&db, &args.plan_id, &inviter)?;
    check_invite(inviter_role, args.role)?;

    let invitee = user_by_email(&db, &args.email)?;
    if db.participant_role(&plan.id, &invitee.id)?.is_some() {
        bail!("{} is already a participant", invitee.email);
    }
    if db.find_invitation_for(&plan.id, &invitee.id)?.is_some() {
        bail!("{} has already been invited", invitee.email);
    }

    let invitation = db.create_invitation(&plan.id, &invitee.id, &inviter.id, args.role)?;
    tracing::info!(invitation_id = %invitation.id, plan_id = %plan.id, role = %args.role, "invitation sent");

    db.notify(
        &[invitee.id.clone()],
        &format!(
            "You've been invited to \"{}\" as {}! Run 'wv respond {} accept' to join.",
            plan.name, args.role, invitation.id
        ),
        Channel::Email,
    );
    db.notify(
        &[inviter.id.clone()],
        &format!("Invited {} as {}.", invitee.full_name(), args.role),
        Channel::Email,
    );
    writeln!(
        writer,
        "Invited {} as {} (invitation {})",
        invitee.full_name(),
        args.role,
        invitation.id
    )?;
    Ok(())
}

pub fn respond<W: Write>(writer: &mut W, args: &RespondArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let responder = acting_user(&db, config)?;
    let invitation_id = InvitationId::new(args.invitation_id.clone())?;
    let invitation = db
        .find_invitation(&invitation_id)?
        .with_context(|| format!("invitation not found: {invitation_id}"))?;

    let answered = invitation.respond(&responder.id, args.response)?;
    db.record_response(&answered)?;
    tracing::info!(invitation_id = %answered.id, status = %answered.status, "invitation answered");

    let plan_name = db
        .find_plan(&answered.plan_id)?
        .map_or_else(|| answered.plan_id.to_string(), |plan| plan.name);

    if answered.status == InvitationStatus::Accepted {
        let participants = db.participant_ids(&answered.plan_id)?;
        db.notify(
            &participants,
            &format!(
                "{} accepted the invite to \"{plan_name}\" as {}!",
                responder.full_name(),
                answered.role
            ),
            Channel::Email,
        );
        db.notify(
            &[responder.id.clone()],
            &format!("Welcome to \"{plan_name}\" as {}!", answered.role),
            Channel::Email,
        );
        writeln!(writer, "Joined \"{plan_name}\" as {}", answered.role)?;
    } else {
        db.notify(
            &[answered.invited_by.clone()],
            &format!(
                "{} rejected the invite to \"{plan_name}\".",
                responder.full_name()
            ),
            Channel::Email,
        );
        db.notify(&[responder.id.clone()], "Invite rejected.", Channel::Email);
        writeln!(writer, "Rejected the invite to \"{plan_name}\"")?;
    }
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let invitations = db.list_invitations_for_user(&user.id)?;

    if invitations.is_empty() {
        writeln!(writer, "No invitations.")?;
        return Ok(());
    }

    let mut output = String::new();
    for invitation in &invitations {
        let plan_name = db
            .find_plan(&invitation.plan_id)?
            .map_or_else(|| invitation.plan_id.to_string(), |plan| plan.name);
        let inviter = db
            .find_user(&invitation.invited_by)?
            .map_or_else(|| invitation.invited_by.to_string(), |u| u.full_name());
        let _ = writeln!(
            output,
            "{}  {:<8}  {:<11}  \"{plan_name}\" from {inviter}",
            invitation.id,
            invitation.status.as_str(),
            invitation.role.as_str(),
        );
    }
    write!(writer, "{output}")?;
    Ok(())
}
