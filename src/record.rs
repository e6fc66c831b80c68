use std::{fmt, sync::Arc};

use dicom::core::Tag;
use dicom::object::{DefaultDicomObject, from_reader};
use dicom_dictionary_std::tags;

use crate::error::{LoadError, ParseFailureReason};
use crate::source::FileSource;

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// Where a record came from: its position in the input batch and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub index: usize,
    pub name: String,
}

impl SourceRef {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Handle to the parsed object holding the pixel data. Decoding is left to
/// the rendering engine.
#[derive(Clone)]
pub struct PixelPayload(Arc<DefaultDicomObject>);

impl PixelPayload {
    pub fn object(&self) -> &DefaultDicomObject {
        &self.0
    }

    pub fn has_pixel_data(&self) -> bool {
        self.0.element(tags::PIXEL_DATA).is_ok()
    }
}

impl fmt::Debug for PixelPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelPayload")
            .field("has_pixel_data", &self.has_pixel_data())
            .finish()
    }
}

/// One parsed image file.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    source: SourceRef,
    series_instance_uid: String,
    study_instance_uid: Option<String>,
    sop_instance_uid: String,
    instance_number: Option<i32>,
    slice_position: Option<f64>,
    modality: Option<String>,
    series_description: Option<String>,
    series_number: Option<i32>,
    pixels: PixelPayload,
}

impl ImageRecord {
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn series_instance_uid(&self) -> &str {
        &self.series_instance_uid
    }

    pub fn study_instance_uid(&self) -> Option<&str> {
        self.study_instance_uid.as_deref()
    }

    pub fn sop_instance_uid(&self) -> &str {
        &self.sop_instance_uid
    }

    pub fn instance_number(&self) -> Option<i32> {
        self.instance_number
    }

    /// z component of ImagePositionPatient
    pub fn slice_position(&self) -> Option<f64> {
        self.slice_position
    }

    pub fn modality(&self) -> Option<&str> {
        self.modality.as_deref()
    }

    pub fn series_description(&self) -> Option<&str> {
        self.series_description.as_deref()
    }

    pub fn series_number(&self) -> Option<i32> {
        self.series_number
    }

    pub fn pixels(&self) -> &PixelPayload {
        &self.pixels
    }
}

pub struct RecordParser;

impl RecordParser {
    /// Read one file and parse it.
    ///
    /// Read failures are reported like parse failures, so a single
    /// unreadable file never aborts the batch.
    pub async fn read_and_parse(
        index: usize,
        source: &dyn FileSource,
    ) -> Result<ImageRecord, LoadError> {
        let source_ref = SourceRef::new(index, source.name());
        let bytes = source.read_bytes().await.map_err(|err| {
            LoadError::new(&source_ref.name, ParseFailureReason::Unreadable(err.to_string()))
        })?;
        Self::parse(source_ref, &bytes)
    }

    /// Parse the bytes of one file into an [`ImageRecord`].
    ///
    /// # Errors
    ///
    /// Returns a `ParseFailure` when the `DICM` marker is missing, the
    /// metadata cannot be read, or the record has no SeriesInstanceUID.
    pub fn parse(source: SourceRef, bytes: &[u8]) -> Result<ImageRecord, LoadError> {
        let fail = |reason| LoadError::new(&source.name, reason);

        let offset = Self::format_marker_offset(bytes)
            .ok_or_else(|| fail(ParseFailureReason::MissingFormatMarker))?;
        let object = from_reader(&bytes[offset..])
            .map_err(|err| fail(ParseFailureReason::Malformed(err.to_string())))?;

        let series_instance_uid = Self::read_text(&object, tags::SERIES_INSTANCE_UID)
            .ok_or_else(|| fail(ParseFailureReason::MissingAttribute("SeriesInstanceUID")))?;
        let sop_instance_uid = Self::read_text(&object, tags::SOP_INSTANCE_UID)
            .unwrap_or_else(|| Self::clean(object.meta().media_storage_sop_instance_uid()));

        let record = ImageRecord {
            study_instance_uid: Self::read_text(&object, tags::STUDY_INSTANCE_UID),
            instance_number: Self::read_int(&object, tags::INSTANCE_NUMBER),
            slice_position: Self::read_slice_position(&object),
            modality: Self::read_text(&object, tags::MODALITY),
            series_description: Self::read_text(&object, tags::SERIES_DESCRIPTION),
            series_number: Self::read_int(&object, tags::SERIES_NUMBER),
            series_instance_uid,
            sop_instance_uid,
            source,
            pixels: PixelPayload(Arc::new(object)),
        };
        log::debug!(
            "Parsed {} (series {}, instance {:?})",
            record.source.name,
            record.series_instance_uid,
            record.instance_number
        );
        Ok(record)
    }

    /// Offset of the `DICM` magic, with or without the 128 byte preamble.
    fn format_marker_offset(bytes: &[u8]) -> Option<usize> {
        if bytes.len() >= PREAMBLE_LEN + MAGIC.len()
            && &bytes[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()] == MAGIC
        {
            return Some(PREAMBLE_LEN);
        }
        if bytes.starts_with(MAGIC) {
            return Some(0);
        }
        None
    }

    fn read_text(object: &DefaultDicomObject, tag: Tag) -> Option<String> {
        object
            .element(tag)
            .ok()?
            .to_str()
            .ok()
            .map(|value| Self::clean(&value))
            .filter(|value| !value.is_empty())
    }

    fn read_int(object: &DefaultDicomObject, tag: Tag) -> Option<i32> {
        object.element(tag).ok()?.to_int::<i32>().ok()
    }

    fn read_slice_position(object: &DefaultDicomObject) -> Option<f64> {
        let position = object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()?
            .to_multi_float64()
            .ok()?;
        position.get(2).copied().filter(|z| z.is_finite())
    }

    // UI values are padded with NUL, text values with spaces
    fn clean(value: &str) -> String {
        value
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string()
    }
}
