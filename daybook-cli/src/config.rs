use anyhow::{Context, Result};
use daybook_core::{DateFormats, Error};
use daybook_ingest::{CsvFileSource, HttpSource, Source};
use daybook_sheets::FormulaSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_daybook_home;

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sheet: SheetSection,
    #[serde(default)]
    pub formulas: FormulaSet,
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub run: RunSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetSection {
    /// Overridden by `SPREADSHEET_ID`.
    pub spreadsheet_id: Option<String>,
    /// Worksheet (tab) receiving the rows. Overridden by `SHEET_NAME`.
    pub sheet_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub kind: SourceKind,
    /// Export file for `kind = "file"`; `--input` wins over it.
    pub path: Option<PathBuf>,
    /// Operations endpoint for `kind = "http"`.
    pub url: Option<String>,
    /// Bearer token for `url`. Overridden by `DAYBOOK_SOURCE_TOKEN`.
    pub token: Option<String>,
    /// chrono format strings, tried in order.
    pub date_formats: Vec<String>,
    pub csv_delimiter: Option<char>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::File,
            path: None,
            url: None,
            token: None,
            date_formats: DateFormats::default().as_slice().to_vec(),
            csv_delimiter: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// IANA zone used to decide what "today" is.
    pub timezone: String,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            timezone: "Europe/Paris".to_string(),
        }
    }
}

impl Config {
    /// Apply the deployment's environment variables on top of the file.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        if let Some(id) = non_empty("SPREADSHEET_ID") {
            self.sheet.spreadsheet_id = Some(id);
        }
        if let Some(name) = non_empty("SHEET_NAME") {
            self.sheet.sheet_name = Some(name);
        }
        if let Some(token) = non_empty("DAYBOOK_SOURCE_TOKEN") {
            self.source.token = Some(token);
        }
    }

    /// Copy safe to print: secrets replaced by a marker.
    pub fn redacted(&self) -> Config {
        let mut cfg = self.clone();
        if cfg.source.token.is_some() {
            cfg.source.token = Some(REDACTED.to_string());
        }
        cfg
    }

    pub fn spreadsheet_id(&self) -> Result<&str, Error> {
        self.sheet
            .spreadsheet_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::configuration("missing spreadsheet id (SPREADSHEET_ID or [sheet].spreadsheet_id)"))
    }

    pub fn sheet_name(&self) -> Result<&str, Error> {
        self.sheet
            .sheet_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::configuration("missing sheet name (SHEET_NAME or [sheet].sheet_name)"))
    }

    pub fn date_formats(&self) -> Result<DateFormats, Error> {
        DateFormats::new(self.source.date_formats.clone())
    }

    pub fn timezone(&self) -> Result<chrono_tz::Tz, Error> {
        self.run
            .timezone
            .parse()
            .map_err(|_| Error::configuration(format!("invalid timezone: {}", self.run.timezone)))
    }

    /// Build the configured transaction source. `input` overrides the file path.
    pub fn source(&self, input: Option<&Path>) -> Result<Source, Error> {
        let formats = self.date_formats()?;

        if let Some(path) = input {
            return self.file_source(path, formats);
        }

        match self.source.kind {
            SourceKind::File => {
                let path = self.source.path.as_deref().ok_or_else(|| {
                    Error::configuration("no input file (pass --input or set [source].path)")
                })?;
                self.file_source(path, formats)
            }
            SourceKind::Http => {
                let url = self
                    .source
                    .url
                    .clone()
                    .ok_or_else(|| Error::configuration("[source].url is required for kind = \"http\""))?;
                Ok(Source::Http(HttpSource::new(url, self.source.token.clone())))
            }
        }
    }

    fn file_source(&self, path: &Path, formats: DateFormats) -> Result<Source, Error> {
        match (Source::from_path(path, formats.clone()), self.source.csv_delimiter) {
            (Source::Csv(_), Some(c)) => {
                let delimiter = u8::try_from(c)
                    .ok()
                    .filter(u8::is_ascii)
                    .ok_or_else(|| Error::configuration(format!("CSV delimiter {c:?} is not ASCII")))?;
                Ok(Source::Csv(CsvFileSource::new(path, formats).with_delimiter(delimiter)))
            }
            (source, _) => Ok(source),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_daybook_home()?.join("config.toml"))
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !p.exists() {
        if path.is_some() {
            return Err(Error::configuration(format!("config file not found: {}", p.display())).into());
        }
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s).map_err(|e| Error::configuration(e.to_string()))?;
    cfg.formulas.validate()?;
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_gets_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.formulas, FormulaSet::default());
        assert_eq!(cfg.run.timezone, "Europe/Paris");
        assert_eq!(cfg.source.kind, SourceKind::File);
        assert!(cfg.spreadsheet_id().is_err());
    }

    #[test]
    fn test_full_file() {
        let cfg = parse_config(
            r#"
[sheet]
spreadsheet_id = "1AbC"
sheet_name = "Transactions"

[formulas]
version = 2
reference_sheet = "Categories"
column_f = "=IFERROR(VLOOKUP(E{row}; '{reference}'!C:D; 2; FALSE); \"\")"
column_g = "=IFERROR(VLOOKUP(E{row}; '{reference}'!C:E; 3; FALSE); \"\")"

[source]
kind = "http"
url = "http://localhost:8080/operations"
date_formats = ["%d/%m/%Y"]

[run]
timezone = "America/Chicago"
"#,
        )
        .unwrap();
        assert_eq!(cfg.spreadsheet_id().unwrap(), "1AbC");
        assert_eq!(cfg.sheet_name().unwrap(), "Transactions");
        assert_eq!(cfg.formulas.version, 2);
        assert!(cfg.formulas.column_f(9).contains("VLOOKUP(E9; 'Categories'!C:D"));
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::America::Chicago);
        assert!(matches!(cfg.source(None).unwrap(), Source::Http(_)));
    }

    #[test]
    fn test_bad_template_is_configuration_error() {
        let err = parse_config("[formulas]\nversion = 3\nreference_sheet = \"x\"\ncolumn_f = \"=1\"\ncolumn_g = \"=E{row}\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("column_f"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut cfg = parse_config("[sheet]\nspreadsheet_id = \"from-file\"\n").unwrap();
        let env: HashMap<&str, &str> = [("SPREADSHEET_ID", "from-env"), ("SHEET_NAME", "  ")].into();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.spreadsheet_id().unwrap(), "from-env");
        assert!(cfg.sheet_name().is_err());
    }

    #[test]
    fn test_source_token_from_env_is_redacted_for_display() {
        let mut cfg = parse_config("[source]\nkind = \"http\"\nurl = \"http://gw/ops\"\ntoken = \"from-file\"\n").unwrap();
        assert_eq!(cfg.source.token.as_deref(), Some("from-file"));

        cfg.apply_env(|k| (k == "DAYBOOK_SOURCE_TOKEN").then(|| "from-env".to_string()));
        assert_eq!(cfg.source.token.as_deref(), Some("from-env"));

        let shown = toml::to_string_pretty(&cfg.redacted()).unwrap();
        assert!(shown.contains("token = \"<redacted>\""), "{shown}");
        assert!(!shown.contains("from-env"));
        assert_eq!(cfg.source.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_no_token_nothing_to_redact() {
        let cfg = Config::default().redacted();
        assert!(cfg.source.token.is_none());
    }

    #[test]
    fn test_input_overrides_source_kind() {
        let mut cfg = Config::default();
        cfg.source.kind = SourceKind::Http;
        let src = cfg.source(Some(Path::new("today.csv"))).unwrap();
        assert!(matches!(src, Source::Csv(_)));
    }

    #[test]
    fn test_file_kind_requires_path() {
        let err = Config::default().source(None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_invalid_timezone() {
        let mut cfg = Config::default();
        cfg.run.timezone = "Mars/Olympus".to_string();
        assert!(cfg.timezone().is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back = parse_config(&s).unwrap();
        assert_eq!(back.formulas, FormulaSet::default());
        assert_eq!(back.source.date_formats, DateFormats::default().as_slice());
    }
}
