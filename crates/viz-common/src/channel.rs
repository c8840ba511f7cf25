//! Channel catalog entries.

use crate::error::{VizError, VizResult};

/// One channel from a backend catalog response.
///
/// Catalog payload lines are colon-separated: `id:code:lon:lat`. The
/// code field may contain spaces (e.g. "AHUD EHZ HV") but never colons.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: i64,
    pub code: String,
    pub lon: f64,
    pub lat: f64,
}

impl Channel {
    /// Parse a catalog payload line.
    pub fn parse(line: &str) -> VizResult<Self> {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 4 {
            return Err(VizError::Transport(format!(
                "malformed channel line: {:?}",
                line
            )));
        }

        let id = parts[0]
            .trim()
            .parse()
            .map_err(|_| VizError::Transport(format!("bad channel id: {:?}", parts[0])))?;
        let lon = parts[2]
            .trim()
            .parse()
            .map_err(|_| VizError::Transport(format!("bad channel lon: {:?}", parts[2])))?;
        let lat = parts[3]
            .trim()
            .parse()
            .map_err(|_| VizError::Transport(format!("bad channel lat: {:?}", parts[3])))?;

        Ok(Self {
            id,
            code: parts[1].trim().to_string(),
            lon,
            lat,
        })
    }

    /// Display key: the first whitespace-delimited token of the code.
    pub fn display_key(&self) -> &str {
        self.code.split_whitespace().next().unwrap_or(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_line() {
        let ch = Channel::parse("17:AHUD EHZ HV:-155.266:19.376").unwrap();
        assert_eq!(ch.id, 17);
        assert_eq!(ch.code, "AHUD EHZ HV");
        assert!((ch.lon - -155.266).abs() < 1e-9);
        assert!((ch.lat - 19.376).abs() < 1e-9);
        assert_eq!(ch.display_key(), "AHUD");
    }

    #[test]
    fn test_parse_rejects_short_line() {
        assert!(Channel::parse("17:AHUD").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_coordinates() {
        assert!(Channel::parse("17:AHUD:east:19.3").is_err());
        assert!(Channel::parse("x:AHUD:-155.2:19.3").is_err());
    }

    #[test]
    fn test_display_key_of_single_token_code() {
        let ch = Channel::parse("3:BBB:12:22").unwrap();
        assert_eq!(ch.display_key(), "BBB");
    }
}
