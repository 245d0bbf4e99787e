//! Run settings, loaded from TOML.
//!
//! ```toml
//! one_timestamp = false
//! alignment_file = "output/alignment.csv"
//! case_info_file = "output/case_table.csv"
//! parse_mode = "lenient"
//!
//! [tool]
//! jar_path = "external_tools/proconformance/ProConformance2.jar"
//! output_dir = "output"
//! log_file = "purchasing.xes"
//! timeout_secs = 600
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alignment_store::ParseMode;
use crate::conformance::ToolConfig;
use crate::domain::{AlignError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Whether events carry only a completion timestamp.
    pub one_timestamp: bool,

    /// Optimal alignments per trace type.
    pub alignment_file: PathBuf,

    /// Trace type and fitness per case.
    pub case_info_file: PathBuf,

    pub parse_mode: ParseMode,

    /// External engine; when absent the alignment files must already exist.
    pub tool: Option<ToolConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            one_timestamp: false,
            alignment_file: PathBuf::from("output/alignment.csv"),
            case_info_file: PathBuf::from("output/case_table.csv"),
            parse_mode: ParseMode::Lenient,
            tool: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.alignment_file.as_os_str().is_empty() {
            return Err(AlignError::Config("alignment_file must not be empty".to_string()));
        }
        if self.case_info_file.as_os_str().is_empty() {
            return Err(AlignError::Config("case_info_file must not be empty".to_string()));
        }
        if let Some(tool) = &self.tool {
            tool.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let settings = Settings::from_toml_str("").expect("parse");
        assert_eq!(settings, Settings::default());
        assert!(!settings.one_timestamp);
        assert_eq!(settings.parse_mode, ParseMode::Lenient);
    }

    #[test]
    fn test_full_document() {
        let raw = r#"
one_timestamp = true
alignment_file = "out/a.csv"
case_info_file = "out/c.csv"
parse_mode = "strict"

[tool]
jar_path = "tools/align.jar"
log_file = "loans.xes"
timeout_secs = 15
"#;
        let settings = Settings::from_toml_str(raw).expect("parse");
        assert!(settings.one_timestamp);
        assert_eq!(settings.parse_mode, ParseMode::Strict);
        assert_eq!(settings.alignment_file, PathBuf::from("out/a.csv"));

        let tool = settings.tool.expect("tool section");
        assert_eq!(tool.program, "java");
        assert_eq!(tool.timeout_secs, 15);
        assert_eq!(tool.file_stem(), "loans");
    }

    #[test]
    fn test_tool_section_is_validated() {
        let raw = "[tool]\nprogram = \"\"\nlog_file = \"x.xes\"\n";
        let err = Settings::from_toml_str(raw).unwrap_err();
        assert!(err.to_string().contains("tool.program"));
    }

    #[test]
    fn test_unknown_parse_mode_is_rejected() {
        let err = Settings::from_toml_str("parse_mode = \"sloppy\"").unwrap_err();
        assert!(matches!(err, AlignError::Toml(_)));
    }
}
