pub mod auth;
pub mod authz;
pub mod config;
pub mod grpc;
pub mod identity;
pub mod state;
pub mod web;
