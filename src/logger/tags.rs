/// Log tags identify the component a message came from
///
/// Each tag has a short console label and a debug key used by
/// `--debug <key>` to enable DEBUG output for that component only.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Relay,
    Extract,
    Cache,
    Batch,
    Other(String),
}

impl LogTag {
    /// Key matched against `--debug <key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Relay => "relay".to_string(),
            LogTag::Extract => "extract".to_string(),
            LogTag::Cache => "cache".to_string(),
            LogTag::Batch => "batch".to_string(),
            LogTag::Other(name) => name.to_lowercase(),
        }
    }

    /// Uncolored label used in log files
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Relay => "RELAY".to_string(),
            LogTag::Extract => "EXTRACT".to_string(),
            LogTag::Cache => "CACHE".to_string(),
            LogTag::Batch => "BATCH".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }

    /// All built-in tags, for help output and flag validation
    pub fn known_debug_keys() -> &'static [&'static str] {
        &["system", "config", "relay", "extract", "cache", "batch"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_keys_match_known_list() {
        let tags = [
            LogTag::System,
            LogTag::Config,
            LogTag::Relay,
            LogTag::Extract,
            LogTag::Cache,
            LogTag::Batch,
        ];
        let keys: Vec<String> = tags.iter().map(|t| t.to_debug_key()).collect();
        assert_eq!(keys, LogTag::known_debug_keys());
    }

    #[test]
    fn test_other_tag_normalization() {
        let tag = LogTag::Other("Probe".to_string());
        assert_eq!(tag.to_debug_key(), "probe");
        assert_eq!(tag.to_plain_string(), "PROBE");
    }
}
