//! Command-line front end for the ChefBot client.

pub mod cli;
pub mod commands;
