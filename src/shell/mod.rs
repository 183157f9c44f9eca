// Composition root for the members service.
//
// Responsibilities
// - Read config from environment.
// - Build the repository, lock registry and one channel per event domain.
// - Start one consumer per channel plus the sweep ticker.
// - Expose the HTTP router that feeds the channels.

pub mod config;
pub mod http;
pub mod state;
pub mod workers;
