//! Trading module for order placement.
//!
//! This module handles:
//! - Order parameters
//! - Signed submission to the CLOB
//! - The order gateway boundary (live and simulated)

pub mod execution;
pub mod gateway;
pub mod order;

pub use execution::{extract_order_id, submit_order};
pub use gateway::{
    classify_response, ExecutionService, LiveGateway, OrderGateway, OrderOutcome, SimulatedGateway,
};
pub use order::{OrderParams, Side, TimeInForce};
