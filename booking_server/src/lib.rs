//! # Booking server
//! This crate hosts the HTTP front end of the tour booking platform. It is responsible for:
//! * Listening for payment webhooks from the gateway.
//! * Answering the payer's browser when it returns from checkout and asks whether the booking went through.
//! * Wiring the [`booking_engine`] to its real collaborators: the gateway REST client, the remote reservation number
//!   service and the mail service used for notifications.
//!
//! Both entry points are thin. Everything that matters happens in
//! [`booking_engine::ReconciliationApi`].
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /webhook/payments`: Payment events from the gateway. Subject to the gateway IP whitelist, if configured.
//! * `POST /api/confirm-payment`: Confirmation requests from the payer's browser.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod webhook_routes;
