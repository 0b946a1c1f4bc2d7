//! MemoryCategory - Classification of a memory record
//!
//! The category doubles as the directory name under a scope and as the
//! `type` key in the front-matter.

use serde::{Deserialize, Serialize};

/// Memory category
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCategory {
    /// Diary entries
    #[default]
    Daily,
    Ideas,
    /// Research notes and findings
    Research,
    /// Image memos (usually carry a Drive URL)
    Images,
    Logs,
    /// Appointments and events
    Schedule,
    /// To-dos
    Tasks,
}

impl MemoryCategory {
    /// Every category, in directory enumeration order
    pub const ALL: [MemoryCategory; 7] = [
        MemoryCategory::Daily,
        MemoryCategory::Ideas,
        MemoryCategory::Research,
        MemoryCategory::Images,
        MemoryCategory::Logs,
        MemoryCategory::Schedule,
        MemoryCategory::Tasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::Daily => "daily",
            MemoryCategory::Ideas => "ideas",
            MemoryCategory::Research => "research",
            MemoryCategory::Images => "images",
            MemoryCategory::Logs => "logs",
            MemoryCategory::Schedule => "schedule",
            MemoryCategory::Tasks => "tasks",
        }
    }
}

impl std::fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemoryCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown memory category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Tasks".parse::<MemoryCategory>(), Ok(MemoryCategory::Tasks));
        assert_eq!(" daily ".parse::<MemoryCategory>(), Ok(MemoryCategory::Daily));
        assert!("diary".parse::<MemoryCategory>().is_err());
    }

    #[test]
    fn test_serde_uses_directory_names() {
        let json = serde_json::to_string(&MemoryCategory::Schedule).unwrap();
        assert_eq!(json, "\"schedule\"");
        for category in MemoryCategory::ALL {
            assert_eq!(category.to_string(), category.as_str());
        }
    }
}
