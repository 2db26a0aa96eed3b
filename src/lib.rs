//! Tile Traffic Library
//!
//! Road-network traffic on an editable tile grid: paint roads, place spawn
//! and destination points, and watch vehicles route and follow each other.

pub mod simulation;
