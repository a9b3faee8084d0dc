//! Client for the ZTM Gdańsk open-data departures API.

pub mod client;

pub use client::{DEFAULT_DEPARTURES_URL, ZtmClient};
