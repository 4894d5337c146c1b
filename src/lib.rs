//! Liquid-nitrogen tank consumption estimation and reorder planning.
//!
//! Readings of the tank level are recorded in a bounded [`state::ObservationLog`],
//! turned into an average daily consumption rate by a [`estimation::model::RateModel`]
//! and projected against a [`estimation::policy::Policy`] to find when an order
//! must be placed.

pub mod api;
pub mod config;
pub mod error;
pub mod estimation;
pub mod input;
pub mod state;
