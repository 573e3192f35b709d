// SPDX-License-Identifier: MPL-2.0

pub mod auth;
pub mod calendar;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod http;
pub mod timelog;
