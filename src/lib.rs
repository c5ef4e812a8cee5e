pub mod action;
pub mod annotations;
pub mod check;
pub mod comment;
pub mod config;
pub mod coverage;
pub mod error;
pub mod github;
pub mod model;
pub mod parse;
pub mod runner;
