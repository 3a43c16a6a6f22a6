//! End-to-end engine tests: service, senders, queue and monitor wired
//! together over in-memory stores and scripted gateways.

mod delivery;
mod monitoring;
mod support;
mod triggers;
