// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod message;
pub mod middleware;
pub mod rate_limit;
pub mod transport;
