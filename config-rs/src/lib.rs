//! config-rs/lib.rs
//! Shared configuration utilities for the analysis services
//! Provides standardized functions for port/address management

use std::env;
use std::net::{Ipv4Addr, SocketAddr};

/// Get service port from environment variables with proper fallback
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "ANALYSIS_GATEWAY")
/// * `default_port` - The default port to use if not specified in environment
///
/// # Returns
/// The port number to use for the service
pub fn get_service_port(service_name: &str, default_port: u16) -> u16 {
    let var_name = format!("{}_SERVICE_PORT", service_name.to_uppercase());
    match env::var(&var_name) {
        Ok(value) => value.trim().parse::<u16>().unwrap_or_else(|_| {
            log::warn!("Invalid port in {}, using default {}", var_name, default_port);
            default_port
        }),
        Err(_) => default_port,
    }
}

/// Create a SocketAddr for binding a service
///
/// `{SERVICE}_SERVICE_ADDR` may hold a full `host:port` or an
/// `http(s)://host:port` URL; otherwise the service binds every interface on
/// the configured port.
pub fn get_bind_address(service_name: &str, default_port: u16) -> SocketAddr {
    let var_name = format!("{}_SERVICE_ADDR", service_name.to_uppercase());

    if let Ok(addr_str) = env::var(&var_name) {
        let stripped = addr_str
            .strip_prefix("http://")
            .or_else(|| addr_str.strip_prefix("https://"))
            .unwrap_or(&addr_str)
            .trim_end_matches('/');
        match stripped.parse::<SocketAddr>() {
            Ok(addr) => return addr,
            Err(_) => log::warn!("Invalid address format in {}, using default", var_name),
        }
    }

    let port = get_service_port(service_name, default_port);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Get client connection address for connecting to a service
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "ANALYSIS_GATEWAY")
/// * `default_port` - The default port to use if not specified in environment
/// * `host` - Optional host to use if not specified in environment (default: "localhost")
///
/// # Returns
/// A base URL for the client to connect to the service
pub fn get_client_address(service_name: &str, default_port: u16, host: Option<&str>) -> String {
    let addr_var_name = format!("{}_SERVICE_ADDR", service_name.to_uppercase());

    if let Ok(addr) = env::var(&addr_var_name) {
        if addr.starts_with("http://") || addr.starts_with("https://") {
            return addr;
        }
        return format!("http://{}", addr);
    }

    let port = get_service_port(service_name, default_port);
    let host = host.unwrap_or("localhost");
    format!("http://{}:{}", host, port)
}

/// Load a `.env` file if one exists, logging where it came from
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(_) => log::debug!("No .env file found, using process environment"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own service name so parallel tests don't share variables.

    #[test]
    fn test_get_service_port() {
        std::env::set_var("PORT_TEST_SERVICE_PORT", "9000");
        assert_eq!(get_service_port("PORT_TEST", 8000), 9000);

        std::env::set_var("BAD_PORT_SERVICE_PORT", "ninety");
        assert_eq!(get_service_port("BAD_PORT", 8000), 8000);

        std::env::remove_var("UNKNOWN_SERVICE_PORT");
        assert_eq!(get_service_port("UNKNOWN", 8000), 8000);
    }

    #[test]
    fn test_get_bind_address() {
        std::env::set_var("BIND_URL_SERVICE_ADDR", "http://127.0.0.1:9100");
        assert_eq!(get_bind_address("BIND_URL", 8000), "127.0.0.1:9100".parse().unwrap());

        std::env::set_var("BIND_BAD_SERVICE_ADDR", "nowhere");
        assert_eq!(get_bind_address("BIND_BAD", 8000), "0.0.0.0:8000".parse().unwrap());

        std::env::set_var("BIND_PORT_SERVICE_PORT", "8123");
        assert_eq!(get_bind_address("bind_port", 8000), "0.0.0.0:8123".parse().unwrap());
    }

    #[test]
    fn test_get_client_address() {
        std::env::set_var("CLIENT_TEST_SERVICE_ADDR", "http://example.com:9000");
        assert_eq!(get_client_address("CLIENT_TEST", 8000, None), "http://example.com:9000");

        std::env::set_var("CLIENT_BARE_SERVICE_ADDR", "10.0.0.5:9000");
        assert_eq!(get_client_address("CLIENT_BARE", 8000, None), "http://10.0.0.5:9000");

        std::env::remove_var("CLIENT_PORT_SERVICE_ADDR");
        std::env::set_var("CLIENT_PORT_SERVICE_PORT", "9001");
        assert_eq!(get_client_address("CLIENT_PORT", 8000, None), "http://localhost:9001");

        assert_eq!(get_client_address("CLIENT_NONE", 8000, Some("service.local")), "http://service.local:8000");
    }
}
