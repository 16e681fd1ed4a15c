//! Menu Planner
//!
//! Ingredient, recipe and menu plan data entry with nutrient roll-ups,
//! served over MCP.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
