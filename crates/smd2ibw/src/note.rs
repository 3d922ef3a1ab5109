//! Wave note generation: a human-readable annotation block summarizing the
//! acquisition, embedded into the output wave.
//!
//! The note has four sections in fixed order: acquisition date, excitation
//! wavelength, grating information, and the selected detector's free-text
//! channel information lines exactly as they appear in the SMD header.

use crate::error::SmdError;
use crate::header::ChannelInfo;
use crate::parser::SimpleCubeParser;

pub const DEFAULT_DETECTOR_ID: usize = 0;

const DATETIME_FMT: &str = "%Y/%m/%d %H:%M:%S";
const INDENT: &str = "  ";

/// Formats the annotation block for one detector of a parsed SMD file.
pub struct NoteGenerator<'a> {
    smd_data: &'a SimpleCubeParser,
    detector_id: usize,
}

impl<'a> NoteGenerator<'a> {
    pub fn new(smd_data: &'a SimpleCubeParser) -> Self {
        Self {
            smd_data,
            detector_id: DEFAULT_DETECTOR_ID,
        }
    }

    /// Select the detector whose channel information is quoted.
    pub fn set_detector_id(&mut self, detector_id: usize) {
        self.detector_id = detector_id;
    }

    fn selected_detector(&self) -> Result<&ChannelInfo, SmdError> {
        self.smd_data
            .detectors()
            .get(self.detector_id)
            .ok_or(SmdError::InvalidDetector {
                id: self.detector_id,
                count: self.smd_data.detector_count(),
            })
    }

    /// Render the full note.
    pub fn generate(&self) -> Result<String, SmdError> {
        let contents = [
            self.acquisition_datetime(),
            self.excitation_wavelength(),
            self.grating_infos(),
            self.channel_infos()?,
        ];
        Ok(contents.join("\n"))
    }

    fn heading(title: &str) -> String {
        format!("<{title}>\n")
    }

    fn acquisition_datetime(&self) -> String {
        let heading = Self::heading("Acquisition date");
        let stamp = self.smd_data.creation_datetime().format(DATETIME_FMT);
        format!("{heading}{INDENT}{stamp}\n")
    }

    fn excitation_wavelength(&self) -> String {
        let heading = Self::heading("Excitation wavelength");
        // {:?} keeps a trailing ".0" on whole numbers, as the reference does
        format!("{heading}{INDENT}{:?}\n", self.smd_data.excite_nm())
    }

    fn grating_infos(&self) -> String {
        let heading = Self::heading("Grating informations");
        let groove = format!("{INDENT}Groove number: {}\n", self.smd_data.grating_groove());
        let central = format!(
            "{INDENT}Central wavelength: {:?}\n",
            self.smd_data.central_wavelength()
        );
        format!("{heading}{groove}{central}")
    }

    /// The detector's informational lines, verbatim and in header order.
    fn channel_infos(&self) -> Result<String, SmdError> {
        let heading = Self::heading("Channel informations");
        let rows: Vec<String> = self
            .selected_detector()?
            .informations
            .iter()
            .map(|(_, line)| format!("{INDENT}{line}"))
            .collect();
        Ok(format!("{heading}{}", rows.join("\n")))
    }
}
