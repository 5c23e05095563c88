//! TrashTagLKA client core.
//!
//! Backend gateway, demo fallback data and the screen controllers behind
//! the cleanup feed, map, camera, challenges and profile screens.

pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod location;
pub mod models;
pub mod navigation;
pub mod screens;
pub mod storage;
pub mod timefmt;
