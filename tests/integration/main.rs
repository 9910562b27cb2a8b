//! Integration tests: full sessions against in-memory feeds and broker.

mod mock_broker;
mod simulation;
