use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wv_cli::commands::{event, inbox, invite, itinerary, participants, plan, user};
use wv_cli::{Cli, Commands, Config, EventCommand, PlanCommand, UserCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // --verbose wins over RUST_LOG
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let mut config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(email) = &cli.as_user {
        config.user = Some(email.clone());
    }
    tracing::debug!(?config, "loaded configuration");

    let mut out = io::stdout().lock();
    match command {
        Commands::User(UserCommand::Add(args)) => user::add(&mut out, args, &config)?,
        Commands::Plan(action) => match action {
            PlanCommand::Create(args) => plan::create(&mut out, args, &config)?,
            PlanCommand::List(args) => plan::list(&mut out, args, &config)?,
            PlanCommand::Show(args) => plan::show(&mut out, args, &config)?,
            PlanCommand::Users(args) => participants::users(&mut out, args, &config)?,
            PlanCommand::RemoveUser(args) => participants::remove(&mut out, args, &config)?,
            PlanCommand::Reassign(args) => participants::reassign(&mut out, args, &config)?,
        },
        Commands::Event(action) => match action {
            EventCommand::Add(args) => event::add(&mut out, args, &config)?,
            EventCommand::Update(args) => event::update(&mut out, args, &config)?,
            EventCommand::Delete(args) => event::delete(&mut out, args, &config)?,
        },
        Commands::Itinerary(args) => itinerary::run(&mut out, args, &config)?,
        Commands::Invite(args) => invite::invite(&mut out, args, &config)?,
        Commands::Respond(args) => invite::respond(&mut out, args, &config)?,
        Commands::Invitations => invite::list(&mut out, &config)?,
        Commands::Inbox => inbox::run(&mut out, &config)?,
    }

    Ok(())
}
