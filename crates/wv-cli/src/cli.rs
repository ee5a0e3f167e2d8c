//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::event::{AddEventArgs, DeleteEventArgs, UpdateEventArgs};
use crate::commands::invite::{InviteArgs, RespondArgs};
use crate::commands::itinerary::ItineraryArgs;
use crate::commands::participants::{ReassignArgs, RemoveUserArgs, UsersArgs};
use crate::commands::plan::{CreatePlanArgs, ListPlansArgs, ShowPlanArgs};
use crate::commands::user::AddUserArgs;

/// Collaborative trip and event planner.
///
/// Plans hold scheduled events; the itinerary numbers them by day in each
/// event's local time zone.
#[derive(Debug, Parser)]
#[command(name = "wv", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Act as the user with this email.
    #[arg(long = "as", global = true, value_name = "EMAIL")]
    pub as_user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage users.
    #[command(subcommand)]
    User(UserCommand),

    /// Create and inspect plans and their participants.
    #[command(subcommand)]
    Plan(PlanCommand),

    /// Add, change or remove scheduled events.
    #[command(subcommand)]
    Event(EventCommand),

    /// Show a plan's day-numbered itinerary.
    Itinerary(ItineraryArgs),

    /// Invite a registered user to a plan.
    Invite(InviteArgs),

    /// Accept or reject an invitation.
    Respond(RespondArgs),

    /// List invitations addressed to you.
    Invitations,

    /// Show your notifications.
    Inbox,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a new user.
    Add(AddUserArgs),
}

#[derive(Debug, Subcommand)]
pub enum PlanCommand {
    /// Create a trip or a venue plan.
    Create(CreatePlanArgs),
    /// List plans you own or take part in.
    List(ListPlansArgs),
    /// Show one plan.
    Show(ShowPlanArgs),
    /// List a plan's participants by role.
    Users(UsersArgs),
    /// Remove a participant from a plan.
    RemoveUser(RemoveUserArgs),
    /// Hand the coordinator role to a planner.
    Reassign(ReassignArgs),
}

#[derive(Debug, Subcommand)]
pub enum EventCommand {
    /// Add an event to a plan.
    Add(AddEventArgs),
    /// Change fields of an existing event.
    Update(UpdateEventArgs),
    /// Delete an event.
    Delete(DeleteEventArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn as_flag_is_global() {
        let cli = Cli::try_parse_from(["wv", "inbox", "--as", "ana@example.com"]).unwrap();
        assert_eq!(cli.as_user.as_deref(), Some("ana@example.com"));
        assert!(matches!(cli.command, Some(Commands::Inbox)));
    }
}
