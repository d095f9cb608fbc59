//! calsync-provider-zoho - Zoho CRM client for calsync
//!
//! Covers the modules calsync touches: Leads, Campaigns, Deals and Contacts
//! for reads, Events (meetings) and Tasks for inserts, Contacts for updates.

mod client;
pub mod types;

pub use client::{MAX_PER_PAGE, Module, RecordPage, ZohoClient};
pub use types::{
    Campaign, Contact, ContactUpdate, Deal, Lead, Lookup, Meeting, Note, Participant, Task,
};
