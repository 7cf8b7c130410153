use std::time::Duration;

pub const DEFAULT_HOST: &str = "82.25.105.26";
pub const DEFAULT_PORT: u16 = 1337;
/// Upper bound of a single receive step.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where to connect and how much to read per receive step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub chunk_size: usize,
    pub connect_timeout: Duration,
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        // a zero-sized read would be indistinguishable from a remote close
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_fixed_endpoint() {
        let config = Config::default();
        assert_eq!(config.addr(), "82.25.105.26:1337");
        assert_eq!(config.chunk_size, 4096);
    }

    #[test]
    fn new_keeps_default_tunables() {
        let config = Config::new("127.0.0.1", 4000);
        assert_eq!(config.addr(), "127.0.0.1:4000");
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn chunk_size_is_never_zero() {
        let config = Config::new("localhost", 1).with_chunk_size(0);
        assert_eq!(config.chunk_size, 1);
    }
}
