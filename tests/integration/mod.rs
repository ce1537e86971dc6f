//! Integration Tests Module
//!
//! End-to-end tests of the bot runtime: the engine with a fake chat adapter,
//! and the resource wrappers over the transport with a fake streaming
//! application.

// Shared test doubles
mod support;

// Engine, dispatch and scheduling through a fake chat adapter
mod engine_test;

// Audio and scenes wrappers against a scripted peer
mod obs_test;
