//! Interpretation of the free-text `desc_val` ("allowed values") attribute of a parameter.

use regex::Regex;
use std::sync::LazyLock;

/// Annotation text meaning "full bipolar range, displayed centered", already implied by the range.
pub const BIPOLAR_SENTINEL: &str = "L64 - 63R";

static MEASUREMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?) ?(\[(.*)\])?$").expect("valid regex"));

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+\.?\d*) ?- ?(\+?\d+\.?\d*)").expect("valid regex")
});

static LABEL_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r", ?").expect("valid regex"));

/// Display metadata extracted from a value annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueAnnotation {
    /// Unit taken from a trailing `[...]` suffix.
    pub display_measurement: Option<String>,
    /// A displayed range that differs from the raw data range.
    pub display_range: Option<(f64, f64)>,
    /// Enumerated labels, indexed by raw value.
    pub labels: Option<Vec<String>>,
}

impl ValueAnnotation {
    pub fn is_empty(&self) -> bool {
        self.display_measurement.is_none() && self.display_range.is_none() && self.labels.is_none()
    }
}

/// Parses `text` against the declared `data_range` of its parameter.
///
/// The measurement suffix is stripped first, then the remainder is read either as a `min - max`
/// display range or as a comma separated label list (the range wins when both could apply).
pub fn parse_value_annotation(text: &str, data_range: (i64, i64)) -> ValueAnnotation {
    let mut annotation = ValueAnnotation::default();

    let mut text = text.trim();
    if text.is_empty() || text == BIPOLAR_SENTINEL {
        return annotation;
    }

    if let Some(caps) = MEASUREMENT_RE.captures(text) {
        if let (Some(rest), Some(unit)) = (caps.get(1), caps.get(3)) {
            annotation.display_measurement = Some(unit.as_str().to_owned());
            text = rest.as_str();
        }
    }

    if let Some(caps) = RANGE_RE.captures(text) {
        let bound = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());

        if let (Some(min), Some(max)) = (bound(1), bound(2)) {
            if min != data_range.0 as f64 || max != data_range.1 as f64 {
                annotation.display_range = Some((min, max));
            }
            return annotation;
        }
    }

    if !text.is_empty() {
        annotation.labels = Some(
            LABEL_SEPARATOR_RE
                .split(text)
                .map(ToOwned::to_owned)
                .collect(),
        );
    }

    annotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_and_sentinel() {
        assert!(parse_value_annotation("", (0, 127)).is_empty());
        assert!(parse_value_annotation("   ", (0, 127)).is_empty());
        assert!(parse_value_annotation("L64 - 63R", (-64, 63)).is_empty());
    }

    #[test]
    fn test_labels() {
        let annotation = parse_value_annotation("OFF, ON", (0, 1));
        assert_eq!(
            annotation.labels,
            Some(vec!["OFF".to_string(), "ON".to_string()])
        );
        assert_eq!(annotation.display_range, None);

        let annotation = parse_value_annotation("SAW,SQR,TRI", (0, 2));
        assert_eq!(
            annotation.labels,
            Some(vec!["SAW".to_string(), "SQR".to_string(), "TRI".to_string()])
        );
    }

    #[test]
    fn test_range_matching_declared_range_is_ignored() {
        assert!(parse_value_annotation("0 - 127", (0, 127)).is_empty());
    }

    #[test]
    fn test_display_range() {
        let annotation = parse_value_annotation("-24 - +24", (0, 48));
        assert_eq!(annotation.display_range, Some((-24.0, 24.0)));
        assert_eq!(annotation.labels, None);

        let annotation = parse_value_annotation("-12.0 - 12.0", (0, 240));
        assert_eq!(annotation.display_range, Some((-12.0, 12.0)));
    }

    #[test]
    fn test_measurement_is_stripped_before_range() {
        let annotation = parse_value_annotation("-20 - +20 [dB]", (0, 40));
        assert_eq!(annotation.display_measurement.as_deref(), Some("dB"));
        assert_eq!(annotation.display_range, Some((-20.0, 20.0)));
    }

    #[test]
    fn test_measurement_only() {
        let annotation = parse_value_annotation("0 - 127 [%]", (0, 127));
        assert_eq!(annotation.display_measurement.as_deref(), Some("%"));
        assert_eq!(annotation.display_range, None);
        assert_eq!(annotation.labels, None);

        let annotation = parse_value_annotation("[ms]", (0, 127));
        assert_eq!(annotation.display_measurement.as_deref(), Some("ms"));
        assert_eq!(annotation.labels, None);
    }
}
