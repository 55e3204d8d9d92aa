//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and collaborator access so route
//! handlers can stay focused on protocol translation and auth plumbing.
//! The record and object collaborators sit behind traits ([`item::ItemStore`],
//! [`media::ObjectStore`]) injected through `AppState`, so tests swap in
//! in-memory fakes.

pub mod account;
pub mod dashboard;
pub mod item;
pub mod media;
pub mod session;
