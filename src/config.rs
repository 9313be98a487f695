use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

impl JwtConfig {
    /// Expiry hint included in auth responses, e.g. "24h".
    pub fn expires_in(&self) -> String {
        format!("{}h", self.ttl_hours)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "calculator-api".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "calculator-users".into()),
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        Ok(Self { database_url, jwt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_in_formats_hours() {
        let jwt = JwtConfig {
            secret: "s".into(),
            issuer: "i".into(),
            audience: "a".into(),
            ttl_hours: 24,
        };
        assert_eq!(jwt.expires_in(), "24h");
    }
}
