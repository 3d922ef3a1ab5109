//! SMD header parsing: the XML-like markup preceding the binary payload.
//!
//! The header is parsed once into a `HeaderNode` tree, and the sections the
//! converter needs (`FrameHeader`, `FrameOptions`, `Stage3DParameters`,
//! `DataCalibration`/`ChannelInfo`) are extracted into typed structs at the
//! same time. Field names below are the verbatim tags used by the
//! acquisition software, misspellings included (`StageAxesDimentions`,
//! `DataDimentions`).

use crate::error::SmdError;
use chrono::NaiveDateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::str::FromStr;

/// Spatial axis names in SMD storage order.
pub const SPATIAL_AXES: [&str; 3] = ["Z", "Y", "X"];

/// Format of the concatenated `Date` + `Time` header fields.
pub const DATETIME_FMT: &str = "%d/%m/%Y %H:%M:%S";

// ─── Header tree ────────────────────────────────────────────────────────────

/// One node of the parsed header markup: either a scalar text value or a
/// branch of ordered, named children. Numbered sibling sequences
/// (`Channel0`, `Channel1`, ...) are plain children looked up by name.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderNode {
    Scalar(String),
    Branch(Vec<(String, HeaderNode)>),
}

impl HeaderNode {
    /// Look up a direct child by name (first match, in document order).
    pub fn get(&self, name: &str) -> Option<&HeaderNode> {
        match self {
            HeaderNode::Scalar(_) => None,
            HeaderNode::Branch(children) => children
                .iter()
                .find(|(child_name, _)| child_name == name)
                .map(|(_, node)| node),
        }
    }

    /// Direct children in document order. Empty for scalars.
    pub fn children(&self) -> &[(String, HeaderNode)] {
        match self {
            HeaderNode::Scalar(_) => &[],
            HeaderNode::Branch(children) => children,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            HeaderNode::Scalar(text) => Some(text),
            HeaderNode::Branch(_) => None,
        }
    }

    fn child(&self, name: &str) -> Result<&HeaderNode, SmdError> {
        self.get(name)
            .ok_or_else(|| SmdError::Format(format!("missing field ({name})")))
    }

    fn scalar(&self, name: &str) -> Result<&str, SmdError> {
        self.child(name)?
            .as_scalar()
            .ok_or_else(|| SmdError::Format(format!("field {name} is not a scalar")))
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<T, SmdError> {
        let text = self.scalar(name)?;
        text.parse()
            .map_err(|_| SmdError::Format(format!("field {name} has invalid value ({text})")))
    }
}

/// Parse the header markup into a tree, returning the `SCANDATA` root.
pub fn parse_markup(header: &[u8]) -> Result<HeaderNode, SmdError> {
    let mut reader = Reader::from_reader(header);
    reader.trim_text(true);

    // stack of open elements: (name, children, text)
    let mut stack: Vec<(String, Vec<(String, HeaderNode)>, String)> = Vec::new();
    let mut root: Option<(String, HeaderNode)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push((name, Vec::new(), String::new()));
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| SmdError::Format(err.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.2.push_str(&text);
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let entry = (name, HeaderNode::Scalar(String::new()));
                match stack.last_mut() {
                    Some(top) => top.1.push(entry),
                    None => root = Some(entry),
                }
            }
            Ok(Event::End(_)) => {
                let (name, children, text) = stack
                    .pop()
                    .ok_or_else(|| SmdError::Format("unbalanced end tag".into()))?;
                let node = if children.is_empty() {
                    HeaderNode::Scalar(text)
                } else {
                    HeaderNode::Branch(children)
                };
                match stack.last_mut() {
                    Some(top) => top.1.push((name, node)),
                    None => root = Some((name, node)),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // declaration, comments, PIs
            Err(err) => return Err(SmdError::Format(err.to_string())),
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(SmdError::Format("unclosed element in header markup".into()));
    }
    match root {
        Some((name, node)) if name == "SCANDATA" => Ok(node),
        Some((name, _)) => Err(SmdError::Format(format!(
            "unexpected root element ({name})"
        ))),
        None => Err(SmdError::Format("empty header markup".into())),
    }
}

// ─── Typed header sections ──────────────────────────────────────────────────

/// `FrameHeader` section: acquisition timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameHeader {
    pub creation_datetime: NaiveDateTime,
}

impl FrameHeader {
    fn from_node(node: &HeaderNode) -> Result<Self, SmdError> {
        let date = node.scalar("Date")?;
        let time = node.scalar("Time")?;
        let text = format!("{date} {time}");
        let creation_datetime = NaiveDateTime::parse_from_str(&text, DATETIME_FMT)
            .map_err(|_| SmdError::Format(format!("invalid Date/Time ({text})")))?;
        Ok(Self { creation_datetime })
    }
}

/// `FrameOptions` section: excitation laser, detector count, grating.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOptions {
    pub excitation_nm: f64,
    pub grating_groove: u32,
    pub central_wavelength: f64,
    multi_detection_raw: usize,
}

impl FrameOptions {
    fn from_node(node: &HeaderNode) -> Result<Self, SmdError> {
        Ok(Self {
            excitation_nm: node.parse("OmuLaserWLnm")?,
            grating_groove: node.parse("OmuGratingGroove")?,
            central_wavelength: node.parse("OmuCentralWaveLengthNM")?,
            multi_detection_raw: node.parse("MultiDetectionCount")?,
        })
    }

    /// Number of detectors in the file.
    ///
    /// The header stores `MultiDetectionCount` as 0 when the file holds a
    /// single detector; that aliasing maps to 1 here.
    pub fn multi_detection_count(&self) -> usize {
        if self.multi_detection_raw == 0 {
            1
        } else {
            self.multi_detection_raw
        }
    }
}

/// One spatial axis of the scanning stage. Real-space coordinates are stored
/// as `scale * count`; the ROI is `[start_count, end_count]` walked in
/// `step_count` increments.
#[derive(Debug, Clone, PartialEq)]
pub struct StageAxisInfo {
    pub unit: String,
    pub scale: f64,
    pub start_count: i64,
    pub end_count: i64,
    pub step_count: i64,
}

impl StageAxisInfo {
    fn from_node(node: &HeaderNode) -> Result<Self, SmdError> {
        Ok(Self {
            unit: node.scalar("AxisUnitName")?.to_string(),
            scale: node.parse("AxisScaleFloat")?,
            start_count: node.parse("AxisCountStart")?,
            end_count: node.parse("AxisCountStop")?,
            step_count: node.parse("AxisCountStep")?,
        })
    }

    /// Real-space coordinate of the ROI start.
    pub fn start_coordinate(&self) -> f64 {
        self.scale * self.start_count as f64
    }

    /// Real-space length of one step.
    pub fn step_length(&self) -> f64 {
        self.scale * self.step_count as f64
    }

    /// Real-space width of the ROI.
    pub fn width(&self) -> f64 {
        (self.end_count - self.start_count) as f64 * self.scale
    }
}

/// `Stage3DParameters` section: per-axis pixel counts and stage info,
/// in the fixed Z, Y, X order.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage3dParameters {
    pub sizes: [usize; 3],
    pub axes: [StageAxisInfo; 3],
}

impl Stage3dParameters {
    fn from_node(node: &HeaderNode) -> Result<Self, SmdError> {
        let mut sizes = [0usize; 3];
        for (i, axis) in SPATIAL_AXES.iter().enumerate() {
            sizes[i] = node.parse(&format!("AxisSize{axis}"))?;
        }

        let dims = node.child("StageAxesDimentions")?;
        let mut axes = Vec::with_capacity(3);
        for axis in SPATIAL_AXES {
            axes.push(StageAxisInfo::from_node(dims.child(&format!("Axis{axis}"))?)?);
        }
        let axes: [StageAxisInfo; 3] = axes
            .try_into()
            .map_err(|_| SmdError::Format("missing stage axis".into()))?;

        Ok(Self { sizes, axes })
    }

    /// Pixel counts in Z, Y, X order.
    pub fn spatial_size(&self) -> [usize; 3] {
        self.sizes
    }

    /// `(start, step)` real-space scaling per axis, in Z, Y, X order.
    pub fn spatial_scales(&self) -> [(f64, f64); 3] {
        std::array::from_fn(|i| {
            let axis = &self.axes[i];
            (axis.start_coordinate(), axis.step_length())
        })
    }

    /// Unit names per axis, in Z, Y, X order.
    pub fn spatial_units(&self) -> [&str; 3] {
        std::array::from_fn(|i| self.axes[i].unit.as_str())
    }
}

/// One channel of a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub device_name: String,
    pub series_count: usize,
    pub size: usize,
    pub unit: String,
    /// The channel's own wavelength axis, in nm.
    pub axis_array: Vec<f32>,
    /// Free-text informational fields, in document order.
    pub informations: Vec<(String, String)>,
}

impl ChannelInfo {
    fn from_node(node: &HeaderNode) -> Result<Self, SmdError> {
        let axis_text = node.scalar("ChannelAxisArray")?;
        let mut axis_array = Vec::new();
        for token in axis_text.split_whitespace() {
            let value = token.parse().map_err(|_| {
                SmdError::Format(format!("invalid ChannelAxisArray value ({token})"))
            })?;
            axis_array.push(value);
        }

        let mut informations = Vec::new();
        if let Some(info) = node.get("ChannelInfo") {
            for (name, child) in info.children() {
                let text = child.as_scalar().unwrap_or_default();
                informations.push((name.clone(), text.to_string()));
            }
        }

        Ok(Self {
            device_name: node.scalar("DeviceName")?.to_string(),
            series_count: node.parse("SeriesSize")?,
            size: node.parse("ChannelSize")?,
            unit: node.scalar("ChannelAxisUnit")?.to_string(),
            axis_array,
            informations,
        })
    }
}

/// `DataCalibration` section: one per detector, holding its channels.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCalibration {
    pub channel_count: usize,
    pub channels: Vec<ChannelInfo>,
}

impl DataCalibration {
    fn from_node(node: &HeaderNode) -> Result<Self, SmdError> {
        let channel_count: usize = node.parse("Channels")?;
        let dims = node.child("DataDimentions")?;
        let mut channels = Vec::with_capacity(channel_count);
        for n in 0..channel_count {
            channels.push(ChannelInfo::from_node(dims.child(&format!("Channel{n}"))?)?);
        }
        Ok(Self {
            channel_count,
            channels,
        })
    }
}

// ─── Whole header ───────────────────────────────────────────────────────────

/// The parsed SMD header: raw bytes (marker included) for byte-verbatim
/// pass-through, the markup tree, and the typed sections.
#[derive(Debug, Clone)]
pub struct SmdHeader {
    buffer: Vec<u8>,
    root: HeaderNode,
    pub frame_header: FrameHeader,
    pub frame_options: FrameOptions,
    pub stage_parameters: Stage3dParameters,
    pub data_calibrations: Vec<DataCalibration>,
}

impl SmdHeader {
    /// Parse header bytes (everything up to and including the boundary
    /// marker).
    pub fn parse(buffer: Vec<u8>) -> Result<Self, SmdError> {
        let root = parse_markup(&buffer)?;
        let frame = root.child("ScannedFrameParameters")?;

        let frame_header = FrameHeader::from_node(frame.child("FrameHeader")?)?;
        let frame_options = FrameOptions::from_node(frame.child("FrameOptions")?)?;
        let stage_parameters =
            Stage3dParameters::from_node(frame.child("Stage3DParameters")?)?;

        // A single detector's calibration is unnumbered; multiple detectors
        // are numbered from 1.
        let detector_count = frame_options.multi_detection_count();
        let mut data_calibrations = Vec::with_capacity(detector_count);
        if detector_count == 1 {
            data_calibrations.push(DataCalibration::from_node(
                frame.child("DataCalibration")?,
            )?);
        } else {
            for n in 1..=detector_count {
                data_calibrations.push(DataCalibration::from_node(
                    frame.child(&format!("DataCalibration{n}"))?,
                )?);
            }
        }

        Ok(Self {
            buffer,
            root,
            frame_header,
            frame_options,
            stage_parameters,
            data_calibrations,
        })
    }

    /// Raw header bytes, including the boundary marker.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The full markup tree, for fields the typed sections do not cover.
    pub fn root(&self) -> &HeaderNode {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{sample_header_xml, SampleSmd};

    fn parse_sample() -> SmdHeader {
        let smd = SampleSmd::default();
        SmdHeader::parse(sample_header_xml(&smd).into_bytes()).unwrap()
    }

    #[test]
    fn test_markup_tree() {
        let root = parse_markup(b"<SCANDATA><A><B>1</B><B>2</B><C/></A></SCANDATA>").unwrap();
        let a = root.get("A").unwrap();
        assert_eq!(a.get("B").unwrap().as_scalar(), Some("1"));
        assert_eq!(a.children().len(), 3);
        assert_eq!(a.children()[1].1, HeaderNode::Scalar("2".into()));
        assert_eq!(a.get("C").unwrap().as_scalar(), Some(""));
    }

    #[test]
    fn test_markup_rejects_malformed() {
        assert!(matches!(
            parse_markup(b"<SCANDATA><A>"),
            Err(SmdError::Format(_))
        ));
        assert!(matches!(
            parse_markup(b"<OTHER></OTHER>"),
            Err(SmdError::Format(_))
        ));
    }

    #[test]
    fn test_creation_datetime() {
        let header = parse_sample();
        let dt = header.frame_header.creation_datetime;
        assert_eq!(dt.format("%Y/%m/%d %H:%M:%S").to_string(), "2022/01/02 12:34:56");
    }

    #[test]
    fn test_detector_count_aliasing() {
        // raw 0 means a single detector
        let smd = SampleSmd::default();
        let header = SmdHeader::parse(sample_header_xml(&smd).into_bytes()).unwrap();
        assert_eq!(header.frame_options.multi_detection_count(), 1);

        let smd = SampleSmd::two_detectors();
        let header = SmdHeader::parse(sample_header_xml(&smd).into_bytes()).unwrap();
        assert_eq!(header.frame_options.multi_detection_count(), 2);
    }

    #[test]
    fn test_frame_options() {
        let header = parse_sample();
        let opts = &header.frame_options;
        assert_eq!(opts.excitation_nm, 532.0);
        assert_eq!(opts.grating_groove, 1800);
        assert_eq!(opts.central_wavelength, 540.5);
    }

    #[test]
    fn test_stage_axes() {
        let header = parse_sample();
        let stage = &header.stage_parameters;
        assert_eq!(stage.spatial_size(), [2, 3, 4]);
        assert_eq!(stage.spatial_units(), ["um", "um", "um"]);

        // X axis of the default sample: scale 0.5, counts 10..22 step 2
        let x = &stage.axes[2];
        assert_eq!(x.start_coordinate(), 5.0);
        assert_eq!(x.step_length(), 1.0);
        assert_eq!(x.width(), 6.0);
        assert_eq!(stage.spatial_scales()[2], (5.0, 1.0));
    }

    #[test]
    fn test_channel_info() {
        let header = parse_sample();
        let calib = &header.data_calibrations[0];
        assert_eq!(calib.channel_count, 1);

        let channel = &calib.channels[0];
        assert_eq!(channel.device_name, "CCD1");
        assert_eq!(channel.series_count, 1);
        assert_eq!(channel.size, 5);
        assert_eq!(channel.unit, "nm");
        assert_eq!(channel.axis_array.len(), 5);
        assert_eq!(channel.axis_array[0], 532.0);

        // informational fields keep document order
        assert_eq!(channel.informations[0].0, "Info0");
        assert_eq!(channel.informations[0].1, "Exposure Time: 1 s");
        assert_eq!(channel.informations[1].1, "Gain: 2");
    }

    #[test]
    fn test_missing_field_is_format_error() {
        let err = SmdHeader::parse(b"<SCANDATA><ScannedFrameParameters/></SCANDATA>".to_vec())
            .unwrap_err();
        assert!(matches!(err, SmdError::Format(_)));
    }
}
