#![forbid(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod deferred;
pub mod head;
pub mod i18n;
pub mod locale;
pub mod logging;
pub mod pages;
pub mod routes;
pub mod scroll;
pub mod slug;
pub mod views;
