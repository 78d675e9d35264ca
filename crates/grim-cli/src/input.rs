//! Reading reported statistics from flags, CSV and JSON.

use std::error::Error;
use std::fs;
use std::io::Read;
use std::path::Path;

use grim_core::{from_json_slice, ErrorInfo, GrimError, ReportedStatistic, ScaleBounds};
use serde::Deserialize;

/// One statistic as typed by a user, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticRow {
    pub n: u64,
    pub mean: String,
    #[serde(default)]
    pub decimals: Option<i64>,
    #[serde(default)]
    pub sd: Option<String>,
    #[serde(default)]
    pub sd_decimals: Option<i64>,
    /// Lower scale bound; `none` leaves the scale unbounded below.
    #[serde(default)]
    pub scale_min: Option<String>,
    #[serde(default)]
    pub scale_max: Option<i64>,
    #[serde(default)]
    pub items: Option<u32>,
    #[serde(default)]
    pub denominator: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

fn precision(field: &str, value: Option<i64>) -> Result<Option<u32>, GrimError> {
    let Some(value) = value else {
        return Ok(None);
    };
    u32::try_from(value).map(Some).map_err(|_| {
        let code = if value < 0 {
            "negative-decimals"
        } else {
            "magnitude-overflow"
        };
        GrimError::InvalidInput(
            ErrorInfo::new(code, "precision must be a non-negative count of decimal places")
                .with_context("field", field)
                .with_context("value", value.to_string()),
        )
    })
}

/// Lower bound as typed: absent means 0, `none` means unbounded.
fn scale_min(value: Option<&str>) -> Result<Option<i64>, GrimError> {
    match value.map(str::trim) {
        None => Ok(ScaleBounds::default().min),
        Some(text) if text.eq_ignore_ascii_case("none") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(|_| {
            GrimError::InvalidInput(
                ErrorInfo::new("malformed-scale", "scale bound must be an integer or `none`")
                    .with_context("field", "scale_min")
                    .with_context("value", text),
            )
        }),
    }
}

impl StatisticRow {
    /// Converts the row into a statistic. Range checks beyond typing are left
    /// to [`ReportedStatistic::validate`].
    pub fn into_statistic(self) -> Result<ReportedStatistic, GrimError> {
        let mut stat = ReportedStatistic::new(self.n, self.mean);
        if let Some(decimals) = precision("decimals", self.decimals)? {
            stat = stat.with_decimals(decimals);
        }
        if let Some(sd) = self.sd {
            stat = stat.with_sd(sd);
        }
        if let Some(decimals) = precision("sd_decimals", self.sd_decimals)? {
            stat = stat.with_sd_decimals(decimals);
        }
        stat = stat.with_scale_bounds(ScaleBounds {
            min: scale_min(self.scale_min.as_deref())?,
            max: self.scale_max,
        });
        if let Some(items) = self.items {
            stat = stat.with_items(items);
        }
        if let Some(denominator) = self.denominator {
            stat = stat.with_denominator(denominator.parse()?);
        }
        if let Some(label) = self.label {
            stat = stat.with_label(label);
        }
        Ok(stat)
    }
}

/// Parses CSV rows with a header naming [`StatisticRow`] fields.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<ReportedStatistic>, Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut stats = Vec::new();
    for (index, row) in reader.deserialize::<StatisticRow>().enumerate() {
        let stat = row?
            .into_statistic()
            .map_err(|err| format!("row {index}: {err}"))?;
        stats.push(stat);
    }
    Ok(stats)
}

/// Loads statistics from a `.csv` or `.json` file.
pub fn load_statistics(path: &Path) -> Result<Vec<ReportedStatistic>, Box<dyn Error>> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => parse_csv(fs::File::open(path)?),
        Some("json") => Ok(from_json_slice(&fs::read(path)?)?),
        _ => Err(format!("unsupported input file {}: expected .csv or .json", path.display()).into()),
    }
}
