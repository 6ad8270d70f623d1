//! Back office de operaciones de alquiler de vehículos
//!
//! Expone el checklist de operaciones de cada reserva, las transiciones de
//! estado validadas y el flujo de devolución.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
