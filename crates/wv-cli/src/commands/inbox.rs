//! Inbox command: notifications queued for the acting user.

use std::io::Write;

use anyhow::Result;

use super::util::{acting_user, open_database};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let notifications = db.list_notifications(&user.id)?;

    if notifications.is_empty() {
        writeln!(writer, "Inbox is empty.")?;
        return Ok(());
    }
    for notification in &notifications {
        writeln!(
            writer,
            "[{}] {}",
            notification.channel, notification.message
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use wv_core::{Channel, Notifier};

    use crate::commands::test_support::Fixture;

    #[test]
    fn inbox_lists_messages_in_order() {
        let fixture = Fixture::new();
        let db = fixture.db();
        db.notify(&[fixture.user.id.clone()], "Welcome aboard", Channel::Email);
        db.notify(&[fixture.user.id.clone()], "Flight moved", Channel::Sms);
        let mut output = Vec::new();

        run(&mut output, &fixture.config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        [email] Welcome aboard
        [sms] Flight moved
        ");
    }

    #[test]
    fn empty_inbox() {
        let fixture = Fixture::new();
        let mut output = Vec::new();
        run(&mut output, &fixture.config).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"Inbox is empty.");
    }
}
