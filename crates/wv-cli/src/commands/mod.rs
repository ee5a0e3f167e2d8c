//! CLI subcommand implementations.

pub mod event;
pub mod inbox;
pub mod invite;
pub mod itinerary;
pub mod participants;
pub mod plan;
pub mod user;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
