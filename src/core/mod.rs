pub mod cache;
pub mod dashboard;
pub mod db;
pub mod event_settings;
pub mod hub;
pub mod participant;
pub mod payment;
pub mod readiness;
pub mod requirements;
pub mod service;
pub mod settings;
pub mod sync;
pub mod truthy;
pub mod validation;
