//! Polls a GTFS-realtime vehicle-position feed and archives it as CSV.
//!
//! The pipeline is [`parser::parse_feed`] → [`fields::FieldSpec`] →
//! [`output::format_records`], driven per poll by [`poll::Poller`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod fields;
pub mod infra;
pub mod output;
pub mod parser;
pub mod poll;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
