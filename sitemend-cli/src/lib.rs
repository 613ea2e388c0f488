//! Command-line front end for `sitemend`.
//!
//! The binary is a thin shell over [`cli::run`]; argument types and
//! [`cli::execute`] are public so the commands can be driven from tests.

pub mod cli;
pub mod logging;
