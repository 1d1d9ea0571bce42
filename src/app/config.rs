use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub queue_buffer_size: usize,
    /// Hard cap on continuation delivery delay, like a queue's max delay.
    pub max_queue_delay_secs: u64,
    /// Delay between settlement-status polls for either leg.
    pub poll_delay_secs: u64,
    pub quote_validity_secs: u64,
    pub initiation_failure_rate: f64,
    pub settlement_failure_rate: f64,
    pub min_settle_polls: u32,
    pub max_settle_polls: u32,
    pub route_advisor_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            queue_buffer_size: env::var("QUEUE_BUFFER_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            max_queue_delay_secs: env::var("MAX_QUEUE_DELAY_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),
            poll_delay_secs: env::var("POLL_DELAY_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            quote_validity_secs: env::var("QUOTE_VALIDITY_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            initiation_failure_rate: env::var("INITIATION_FAILURE_RATE")
                .unwrap_or_else(|_| "0.05".to_string())
                .parse()
                .unwrap_or(0.05),
            settlement_failure_rate: env::var("SETTLEMENT_FAILURE_RATE")
                .unwrap_or_else(|_| "0.03".to_string())
                .parse()
                .unwrap_or(0.03),
            min_settle_polls: env::var("MIN_SETTLE_POLLS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            max_settle_polls: env::var("MAX_SETTLE_POLLS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            route_advisor_url: env::var("ROUTE_ADVISOR_URL").ok(),
        }
    }
}
