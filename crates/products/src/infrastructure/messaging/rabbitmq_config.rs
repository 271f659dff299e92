// crates/products/src/infrastructure/messaging/rabbitmq_config.rs

pub struct RabbitMqConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub exchange: String,
}

impl RabbitMqConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("RABBITMQ_HOST", "localhost"),
            port: env_or("RABBITMQ_PORT", "5672"),
            user: env_or("RABBITMQ_USER", "guest"),
            password: env_or("RABBITMQ_PASSWORD", "guest"),
            exchange: env_or("RABBITMQ_EXCHANGE", "products_events"),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}",
            self.user, self.password, self.host, self.port
        )
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
