#[macro_use]
extern crate rocket;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, CoreFairing, DatabaseFairing, NotifierFairing};
use crate::logging::LoggerFairing;
use crate::sweeper::OtpSweeper;

pub mod api;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod model;
pub mod sweeper;

/// Assemble the server. Fairing order matters: the voting core is built from
/// the config and store the earlier fairings put into managed state.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(NotifierFairing)
        .attach(CoreFairing::default())
        .attach(OtpSweeper::default())
        .mount("/", api::routes())
        .register("/", api::catchers())
}
