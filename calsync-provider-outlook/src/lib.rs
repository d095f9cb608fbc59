//! calsync-provider-outlook - Microsoft Graph client for calsync
//!
//! Reads the signed-in user's calendar and mailbox and creates events in
//! batches. Authentication uses a delegated refresh token; access tokens are
//! cached in memory by `calsync_core::TokenCache`.

mod batch;
mod client;
pub mod types;

pub use batch::{BatchFailure, BatchOutcome, CreatedEvent, MAX_BATCH_SIZE};
pub use client::OutlookClient;
pub use types::{
    Attendee, DateTimeTimeZone, EmailAddress, GraphEvent, GraphMessage, ItemBody, Location,
    Recipient,
};
