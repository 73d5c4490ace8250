#![forbid(unsafe_code)]

pub mod agent;
pub mod cli;
pub mod control;
pub mod dom;
pub mod expand;
pub mod export;
pub mod extract;
pub mod filename;
pub mod formats;
pub mod layout;
pub mod logging;
pub mod net;
pub mod options;
pub mod text;
