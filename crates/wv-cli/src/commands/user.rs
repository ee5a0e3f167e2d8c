//! User registration.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use super::util::open_database;
use crate::Config;

#[derive(Debug, Args)]
pub struct AddUserArgs {
    /// First name.
    #[arg(long = "first")]
    pub first_name: String,
    /// Last name.
    #[arg(long = "last", default_value = "")]
    pub last_name: String,
    /// Email address; must be unique.
    #[arg(long)]
    pub email: String,
}

pub fn add<W: Write>(writer: &mut W, args: &AddUserArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let user = db.create_user(&args.first_name, &args.last_name, &args.email)?;
    tracing::info!(user_id = %user.id, "user registered");
    writeln!(writer, "Registered {} <{}>", user.full_name(), user.email)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::commands::test_support::Fixture;

    fn args(first: &str, email: &str) -> AddUserArgs {
        AddUserArgs {
            first_name: first.to_string(),
            last_name: "Cruz".to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn add_registers_user_with_normalized_email() {
        let fixture = Fixture::new();
        let mut output = Vec::new();

        add(&mut output, &args("Bea", " Bea@Example.com "), &fixture.config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @"Registered Bea Cruz <bea@example.com>");
        assert!(fixture.db().find_user_by_email("bea@example.com").unwrap().is_some());
    }

    #[test]
    fn add_rejects_duplicate_email() {
        let fixture = Fixture::new();
        let mut output = Vec::new();

        let err = add(&mut output, &args("Ana", "ana@example.com"), &fixture.config).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn add_rejects_malformed_email() {
        let fixture = Fixture::new();
        let mut output = Vec::new();

        let err = add(&mut output, &args("Bea", "not-an-email"), &fixture.config).unwrap_err();
        assert!(err.to_string().contains("invalid email"));
    }
}
