//! Startup banner and URL display

use super::constants::APP_NAME;
use crate::data::sql::Backend;

/// Whether the host binds every interface
fn is_all_interfaces(host: &str) -> bool {
    host == "0.0.0.0" || host == "::"
}

/// Host shown in URLs (localhost when binding to all interfaces)
pub(crate) fn display_host(host: &str) -> &str {
    if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    }
}

/// Print the startup banner with URLs
pub fn print_banner(host: &str, port: u16, backend: Backend, database: &str) {
    let host = display_host(host);

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    const W: usize = 10;

    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/v1/project/default/query",
        "Query:", host, port
    );
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/openapi.json",
        "OpenAPI:", host, port
    );
    println!(
        "  \x1b[90m➜  {:<W$} {} ({})\x1b[0m",
        "Store:",
        backend.name(),
        database
    );

    println!();
}
