use serde::Deserialize;

/// A feed poll period as written in the config: bare minutes, or a string
/// such as "30m", "1h", "1d".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PeriodSpec {
    Minutes(u32),
    Text(String),
}

impl PeriodSpec {
    pub fn minutes(&self) -> Result<u32, String> {
        match self {
            PeriodSpec::Minutes(m) => Ok(*m),
            PeriodSpec::Text(s) => parse_period(s),
        }
    }
}

/// Parse a period string like "90", "30m", "6h", "1d", "2w" into minutes.
pub fn parse_period(s: &str) -> Result<u32, String> {
    let s = s.trim().to_lowercase();

    let (number, scale) = if let Some(m) = s.strip_suffix('m') {
        (m, 1)
    } else if let Some(h) = s.strip_suffix('h') {
        (h, 60)
    } else if let Some(d) = s.strip_suffix('d') {
        (d, 60 * 24)
    } else if let Some(w) = s.strip_suffix('w') {
        (w, 60 * 24 * 7)
    } else {
        (s.as_str(), 1)
    };

    number
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .ok_or_else(|| format!("Invalid period: {}. Use format like '30m', '1h', '1d'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period_units() {
        assert_eq!(parse_period("45"), Ok(45));
        assert_eq!(parse_period("30m"), Ok(30));
        assert_eq!(parse_period("1h"), Ok(60));
        assert_eq!(parse_period("6H"), Ok(360));
        assert_eq!(parse_period("1d"), Ok(1440));
        assert_eq!(parse_period("2w"), Ok(20160));
        assert_eq!(parse_period(" 3h "), Ok(180));
    }

    #[test]
    fn test_parse_period_rejects_garbage() {
        assert!(parse_period("").is_err());
        assert!(parse_period("soon").is_err());
        assert!(parse_period("-5m").is_err());
        assert!(parse_period("10s").is_err());
    }
}
