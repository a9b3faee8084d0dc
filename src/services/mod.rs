pub mod departures_api;

pub use departures_api::DeparturesApi;
