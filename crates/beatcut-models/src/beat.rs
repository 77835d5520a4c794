//! Beat timeline parsing.
//!
//! A beat timeline is an XML document listing `<Beat index=".." time=".."/>`
//! elements anywhere in the tree and a `<Duration>` element holding the
//! total track length in seconds:
//!
//! ```xml
//! <BeatMap>
//!   <Duration>23.5</Duration>
//!   <Beats>
//!     <Beat index="0" time="0.00"/>
//!     <Beat index="1" time="0.48"/>
//!   </Beats>
//! </BeatMap>
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for timeline operations.
pub type TimelineResult<T> = Result<T, TimelineError>;

/// Errors raised while reading or validating a beat timeline.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("Malformed beat timeline: {0}")]
    MalformedXml(String),

    #[error("Beat element {position} has invalid attribute '{attribute}': {value:?}")]
    InvalidBeat {
        position: usize,
        attribute: &'static str,
        value: Option<String>,
    },

    #[error("Beat timeline has no <Duration> element")]
    MissingDuration,

    #[error("Invalid timeline duration: {0}")]
    InvalidDuration(String),

    #[error("Beat timeline contains no beats")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A timestamped cut boundary in the backing track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatMark {
    pub index: u32,
    /// Seconds from the start of the track
    pub time: f64,
}

impl BeatMark {
    pub fn new(index: u32, time: f64) -> Self {
        Self { index, time }
    }
}

/// Beat marks plus the total length of the track they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatTimeline {
    marks: Vec<BeatMark>,
    total_duration: f64,
}

impl BeatTimeline {
    /// Build a validated timeline. Marks are sorted by time.
    pub fn new(mut marks: Vec<BeatMark>, total_duration: f64) -> TimelineResult<Self> {
        if !total_duration.is_finite() || total_duration <= 0.0 {
            return Err(TimelineError::InvalidDuration(total_duration.to_string()));
        }
        if marks.is_empty() {
            return Err(TimelineError::Empty);
        }
        if let Some((position, mark)) = marks
            .iter()
            .enumerate()
            .find(|(_, m)| !m.time.is_finite() || m.time < 0.0)
        {
            return Err(TimelineError::InvalidBeat {
                position,
                attribute: "time",
                value: Some(mark.time.to_string()),
            });
        }

        // Input order is not trusted
        marks.sort_by(|a, b| a.time.total_cmp(&b.time));

        Ok(Self {
            marks,
            total_duration,
        })
    }

    /// Read a timeline from a beats XML file.
    pub fn from_file(path: impl AsRef<Path>) -> TimelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_xml_str(&content)
    }

    /// Parse a timeline from beats XML.
    pub fn from_xml_str(xml: &str) -> TimelineResult<Self> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| TimelineError::MalformedXml(format!("XML parse error: {}", e)))?;

        let mut marks = Vec::new();
        for (position, node) in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "Beat")
            .enumerate()
        {
            let index = parse_attr::<u32>(&node, "index", position)?;
            let time = parse_attr::<f64>(&node, "time", position)?;
            marks.push(BeatMark::new(index, time));
        }

        let duration_text = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "Duration")
            .ok_or(TimelineError::MissingDuration)?
            .text()
            .unwrap_or_default()
            .trim()
            .to_string();
        let total_duration: f64 = duration_text
            .parse()
            .map_err(|_| TimelineError::InvalidDuration(duration_text.clone()))?;

        Self::new(marks, total_duration)
    }

    /// Beat marks in chronological order.
    pub fn marks(&self) -> &[BeatMark] {
        &self.marks
    }

    /// Total track duration in seconds.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }
}

fn parse_attr<T: std::str::FromStr>(
    node: &roxmltree::Node<'_, '_>,
    attribute: &'static str,
    position: usize,
) -> TimelineResult<T> {
    let raw = node.attribute(attribute);
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .ok_or_else(|| TimelineError::InvalidBeat {
            position,
            attribute,
            value: raw.map(str::to_string),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<BeatMap>
  <Duration>3.0</Duration>
  <Beats>
    <Beat index="2" time="2.001"/>
    <Beat index="0" time="0.0"/>
    <Beat index="1" time="1.003"/>
  </Beats>
</BeatMap>"#;

    #[test]
    fn test_parse_sorts_marks() {
        let timeline = BeatTimeline::from_xml_str(SAMPLE).unwrap();
        let indices: Vec<u32> = timeline.marks().iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!((timeline.total_duration() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_duration() {
        let xml = r#"<BeatMap><Beat index="0" time="0.0"/></BeatMap>"#;
        assert!(matches!(
            BeatTimeline::from_xml_str(xml),
            Err(TimelineError::MissingDuration)
        ));
    }

    #[test]
    fn test_no_beats() {
        let xml = "<BeatMap><Duration>10</Duration></BeatMap>";
        assert!(matches!(
            BeatTimeline::from_xml_str(xml),
            Err(TimelineError::Empty)
        ));
    }

    #[test]
    fn test_bad_time_attribute() {
        let xml = r#"<BeatMap><Duration>10</Duration><Beat index="0" time="soon"/></BeatMap>"#;
        match BeatTimeline::from_xml_str(xml) {
            Err(TimelineError::InvalidBeat { attribute, value, .. }) => {
                assert_eq!(attribute, "time");
                assert_eq!(value.as_deref(), Some("soon"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert!(BeatTimeline::new(vec![BeatMark::new(0, 0.0)], 0.0).is_err());
        assert!(BeatTimeline::new(vec![BeatMark::new(0, 0.0)], f64::NAN).is_err());
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            BeatTimeline::from_xml_str("<BeatMap><Duration>"),
            Err(TimelineError::MalformedXml(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beats.xml");
        std::fs::write(&path, SAMPLE).unwrap();
        let timeline = BeatTimeline::from_file(&path).unwrap();
        assert_eq!(timeline.marks().len(), 3);
    }
}
