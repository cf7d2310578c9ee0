//! Unit and mock-server tests for the analysis SDK

pub mod support;

pub mod orchestrator_tests;
pub mod resilience_tests;
