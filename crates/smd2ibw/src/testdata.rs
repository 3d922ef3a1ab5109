//! Synthetic SMD fixtures shared by the unit tests.

use crate::parser::XML_BORDER;

pub struct SampleDetector {
    pub name: &'static str,
    /// Spectral sample count (`ChannelSize`).
    pub size: usize,
    /// First wavelength of the channel axis; values step by 1 nm.
    pub base_nm: f64,
    /// Value written to `SeriesSize`.
    pub series: usize,
    /// Value written to `Channels` (channel blocks emitted to match).
    pub channels: usize,
}

pub struct SampleSmd {
    /// Spatial sizes in Z, Y, X order.
    pub spatial: [usize; 3],
    /// Raw value written to `MultiDetectionCount` (0 aliases to 1).
    pub multi_detection_raw: usize,
    pub detectors: Vec<SampleDetector>,
}

impl Default for SampleSmd {
    fn default() -> Self {
        Self {
            spatial: [2, 3, 4],
            multi_detection_raw: 0,
            detectors: vec![SampleDetector {
                name: "CCD1",
                size: 5,
                base_nm: 532.0,
                series: 1,
                channels: 1,
            }],
        }
    }
}

impl SampleSmd {
    pub fn two_detectors() -> Self {
        Self {
            spatial: [2, 3, 4],
            multi_detection_raw: 2,
            detectors: vec![
                SampleDetector {
                    name: "CCD1",
                    size: 5,
                    base_nm: 532.0,
                    series: 1,
                    channels: 1,
                },
                SampleDetector {
                    name: "InGaAs",
                    size: 3,
                    base_nm: 640.0,
                    series: 1,
                    channels: 1,
                },
            ],
        }
    }

    pub fn spectral_total(&self) -> usize {
        self.detectors.iter().map(|d| d.size).sum()
    }
}

fn channel_xml(det: &SampleDetector, channel_id: usize) -> String {
    let axis: Vec<String> = (0..det.size)
        .map(|i| format!("{:.1}", det.base_nm + i as f64))
        .collect();
    format!(
        "<Channel{id}>\
         <DeviceName>{name}</DeviceName>\
         <SeriesSize>{series}</SeriesSize>\
         <ChannelSize>{size}</ChannelSize>\
         <ChannelAxisUnit>nm</ChannelAxisUnit>\
         <ChannelAxisArray>{axis}</ChannelAxisArray>\
         <ChannelInfo>\
         <Info0>Exposure Time: 1 s</Info0>\
         <Info1>Gain: 2</Info1>\
         </ChannelInfo>\
         </Channel{id}>",
        id = channel_id,
        name = det.name,
        series = det.series,
        size = det.size,
        axis = axis.join(" "),
    )
}

fn calibration_xml(det: &SampleDetector, tag: &str) -> String {
    let channels: String = (0..det.channels).map(|c| channel_xml(det, c)).collect();
    format!(
        "<{tag}><Channels>{count}</Channels><DataDimentions>{channels}</DataDimentions></{tag}>",
        count = det.channels,
    )
}

fn stage_axis_xml(axis: &str, scale: f64, start: i64, stop: i64, step: i64) -> String {
    format!(
        "<Axis{axis}>\
         <AxisUnitName>um</AxisUnitName>\
         <AxisScaleFloat>{scale}</AxisScaleFloat>\
         <AxisCountStart>{start}</AxisCountStart>\
         <AxisCountStop>{stop}</AxisCountStop>\
         <AxisCountStep>{step}</AxisCountStep>\
         </Axis{axis}>"
    )
}

/// Render the header markup, ending with the boundary marker.
pub fn sample_header_xml(smd: &SampleSmd) -> String {
    let calibrations: String = if smd.multi_detection_raw == 0 {
        calibration_xml(&smd.detectors[0], "DataCalibration")
    } else {
        smd.detectors
            .iter()
            .enumerate()
            .map(|(i, det)| calibration_xml(det, &format!("DataCalibration{}", i + 1)))
            .collect()
    };

    format!(
        "<SCANDATA>\
         <ScannedFrameParameters>\
         <FrameHeader><Date>02/01/2022</Date><Time>12:34:56</Time></FrameHeader>\
         <FrameOptions>\
         <MultiDetectionCount>{raw}</MultiDetectionCount>\
         <OmuLaserWLnm>532.0</OmuLaserWLnm>\
         <OmuGratingGroove>1800</OmuGratingGroove>\
         <OmuCentralWaveLengthNM>540.5</OmuCentralWaveLengthNM>\
         </FrameOptions>\
         <Stage3DParameters>\
         <AxisSizeZ>{z}</AxisSizeZ><AxisSizeY>{y}</AxisSizeY><AxisSizeX>{x}</AxisSizeX>\
         <StageAxesDimentions>{az}{ay}{ax}</StageAxesDimentions>\
         </Stage3DParameters>\
         {calibrations}\
         </ScannedFrameParameters>\
         </SCANDATA>\r\n",
        raw = smd.multi_detection_raw,
        z = smd.spatial[0],
        y = smd.spatial[1],
        x = smd.spatial[2],
        az = stage_axis_xml("Z", 2.0, 0, 2, 1),
        ay = stage_axis_xml("Y", 1.0, 3, 9, 3),
        ax = stage_axis_xml("X", 0.5, 10, 22, 2),
    )
}

/// Row-major payload values: the flat sample index, as f32.
pub fn sample_body_values(smd: &SampleSmd) -> Vec<f32> {
    let n = smd.spatial.iter().product::<usize>() * smd.spectral_total();
    (0..n).map(|i| i as f32).collect()
}

/// Render a complete SMD file: header + little-endian f32 payload.
pub fn sample_file(smd: &SampleSmd) -> Vec<u8> {
    let mut buf = sample_header_xml(smd).into_bytes();
    assert!(buf.ends_with(XML_BORDER));
    for val in sample_body_values(smd) {
        buf.extend_from_slice(&val.to_le_bytes());
    }
    buf
}
