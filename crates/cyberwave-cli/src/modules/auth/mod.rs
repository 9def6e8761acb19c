mod actions;
pub(crate) mod args;
mod http;
mod types;

pub(crate) use actions::{handle_login, handle_logout, run_device_flow};
pub(crate) use http::DeviceFlowClient;
#[cfg(test)]
pub(crate) use types::{DeviceAuthSession, PollOutcome, PollStatus};
