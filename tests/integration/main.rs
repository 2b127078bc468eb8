//! Integration tests for the engine session, driven on tokio's paused clock.

mod mock_clock;
mod simulation;
