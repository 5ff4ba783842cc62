//! Koperasi Service - cooperative member management and point of sale.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
