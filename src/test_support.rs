//! Fixtures shared by the unit tests: in-memory DICOM files, slow sources
//! and a rendering engine that records what it is asked to do.

use std::{
    cell::{Cell, RefCell},
    io,
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::tags;

use crate::error::{InitError, RenderError};
use crate::grid::SlotId;
use crate::record::{ImageRecord, RecordParser, SourceRef};
use crate::series::{SeriesGroup, SeriesGrouper};
use crate::source::{FileSource, MemorySource};

const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";

#[derive(Debug, Clone)]
pub(crate) struct FixtureFile {
    series_uid: Option<String>,
    sop_uid: String,
    instance_number: Option<i32>,
    slice_z: Option<f64>,
    modality: Option<String>,
    description: Option<String>,
}

impl FixtureFile {
    pub(crate) fn new(series_uid: impl Into<String>, sop_uid: impl Into<String>) -> Self {
        Self {
            series_uid: Some(series_uid.into()),
            ..Self::without_series(sop_uid)
        }
    }

    pub(crate) fn without_series(sop_uid: impl Into<String>) -> Self {
        Self {
            series_uid: None,
            sop_uid: sop_uid.into(),
            instance_number: None,
            slice_z: None,
            modality: None,
            description: None,
        }
    }

    pub(crate) fn instance(mut self, number: i32) -> Self {
        self.instance_number = Some(number);
        self
    }

    pub(crate) fn slice_z(mut self, z: f64) -> Self {
        self.slice_z = Some(z);
        self
    }

    pub(crate) fn modality(mut self, modality: &str) -> Self {
        self.modality = Some(modality.to_string());
        self
    }

    pub(crate) fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub(crate) fn name(&self) -> String {
        format!("{}.dcm", self.sop_uid)
    }

    /// Complete Part 10 file: preamble, magic, meta group and data set
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(
            tags::STUDY_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from("1.2.3"),
        ));
        obj.put(DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(self.sop_uid.as_str()),
        ));
        if let Some(series_uid) = &self.series_uid {
            obj.put(DataElement::new(
                tags::SERIES_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from(series_uid.as_str()),
            ));
        }
        if let Some(number) = self.instance_number {
            obj.put(DataElement::new(
                tags::INSTANCE_NUMBER,
                VR::IS,
                PrimitiveValue::from(number.to_string()),
            ));
        }
        if let Some(z) = self.slice_z {
            let position = vec!["0".to_string(), "0".to_string(), z.to_string()];
            obj.put(DataElement::new(
                tags::IMAGE_POSITION_PATIENT,
                VR::DS,
                PrimitiveValue::Strs(position.into()),
            ));
        }
        if let Some(modality) = &self.modality {
            obj.put(DataElement::new(
                tags::MODALITY,
                VR::CS,
                PrimitiveValue::from(modality.as_str()),
            ));
        }
        if let Some(description) = &self.description {
            obj.put(DataElement::new(
                tags::SERIES_DESCRIPTION,
                VR::LO,
                PrimitiveValue::from(description.as_str()),
            ));
        }

        let file = obj
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
                    .media_storage_sop_class_uid(CT_IMAGE_STORAGE)
                    .media_storage_sop_instance_uid(self.sop_uid.as_str()),
            )
            .expect("fixture meta should be complete");
        let mut bytes = Vec::new();
        file.write_all(&mut bytes)
            .expect("fixture should serialize");
        bytes
    }

    pub(crate) fn source(&self) -> Box<dyn FileSource> {
        Box::new(MemorySource::new(self.name(), self.to_bytes()))
    }
}

pub(crate) fn record(index: usize, file: FixtureFile) -> ImageRecord {
    RecordParser::parse(SourceRef::new(index, file.name()), &file.to_bytes())
        .expect("fixture should parse")
}

/// `count` single-image series "S0", "S1", ...
pub(crate) fn series_list(count: usize) -> Vec<Arc<SeriesGroup>> {
    let records = (0..count)
        .map(|i| record(i, FixtureFile::new(format!("S{i}"), format!("{i}.1"))))
        .collect();
    SeriesGrouper::group(records)
        .into_iter()
        .map(Arc::new)
        .collect()
}

pub(crate) fn garbage_bytes() -> Vec<u8> {
    b"this is a text file, not an image".to_vec()
}

/// Valid preamble and magic followed by a cut-off meta group
pub(crate) fn truncated_dicom_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    bytes.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04]);
    bytes
}

pub(crate) fn garbage_source(name: &str) -> Box<dyn FileSource> {
    Box::new(MemorySource::new(name, garbage_bytes()))
}

pub(crate) fn truncated_source(name: &str) -> Box<dyn FileSource> {
    Box::new(MemorySource::new(name, truncated_dicom_bytes()))
}

/// Counts reads in flight and remembers the peak.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    current: Cell<usize>,
    peak: Cell<usize>,
}

impl InFlight {
    pub(crate) fn peak(&self) -> usize {
        self.peak.get()
    }

    fn enter(&self) {
        let current = self.current.get() + 1;
        self.current.set(current);
        self.peak.set(self.peak.get().max(current));
    }

    fn leave(&self) {
        self.current.set(self.current.get() - 1);
    }
}

/// A source whose read completes only after `delay`.
pub(crate) struct DelayedSource {
    inner: MemorySource,
    delay: Duration,
    in_flight: Option<Rc<InFlight>>,
}

impl DelayedSource {
    pub(crate) fn new(file: FixtureFile, delay: Duration) -> Self {
        Self {
            inner: MemorySource::new(file.name(), file.to_bytes()),
            delay,
            in_flight: None,
        }
    }

    pub(crate) fn garbage(name: &str, delay: Duration) -> Self {
        Self {
            inner: MemorySource::new(name, garbage_bytes()),
            delay,
            in_flight: None,
        }
    }

    pub(crate) fn tracked(mut self, in_flight: Rc<InFlight>) -> Self {
        self.in_flight = Some(in_flight);
        self
    }
}

#[async_trait(?Send)]
impl FileSource for DelayedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        if let Some(in_flight) = &self.in_flight {
            in_flight.enter();
        }
        tokio::time::sleep(self.delay).await;
        if let Some(in_flight) = &self.in_flight {
            in_flight.leave();
        }
        self.inner.read_bytes().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineCall {
    Bind(SlotId, String),
    Unbind(SlotId),
}

impl EngineCall {
    fn slot(&self) -> SlotId {
        match self {
            EngineCall::Bind(slot, _) | EngineCall::Unbind(slot) => *slot,
        }
    }
}

/// Fake engine: records every call, optionally failing init or one slot.
#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    init_error: Option<String>,
    init_delay: Option<Duration>,
    failing_slot: Option<SlotId>,
    init_calls: Cell<usize>,
    calls: RefCell<Vec<EngineCall>>,
}

impl RecordingEngine {
    pub(crate) fn failing_init(message: &str) -> Self {
        Self {
            init_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn slow_init(delay: Duration) -> Self {
        Self::default().with_init_delay(delay)
    }

    pub(crate) fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = Some(delay);
        self
    }

    pub(crate) fn failing_slot(slot: SlotId) -> Self {
        Self {
            failing_slot: Some(slot),
            ..Self::default()
        }
    }

    pub(crate) fn init_calls(&self) -> usize {
        self.init_calls.get()
    }

    pub(crate) fn calls_for(&self, slot: SlotId) -> Vec<EngineCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.slot() == slot)
            .cloned()
            .collect()
    }
}

#[async_trait(?Send)]
impl crate::viewport::RenderingEngine for RecordingEngine {
    async fn initialize(&self) -> Result<(), InitError> {
        self.init_calls.set(self.init_calls.get() + 1);
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.init_error {
            Some(message) => Err(InitError(message.clone())),
            None => Ok(()),
        }
    }

    async fn bind(&self, slot: SlotId, series: &Arc<SeriesGroup>) -> Result<(), RenderError> {
        if self.failing_slot == Some(slot) {
            return Err(RenderError(format!("viewport {} has no canvas", slot.0)));
        }
        self.calls.borrow_mut().push(EngineCall::Bind(
            slot,
            series.series_instance_uid().to_string(),
        ));
        Ok(())
    }

    async fn unbind(&self, slot: SlotId) {
        self.calls.borrow_mut().push(EngineCall::Unbind(slot));
    }
}
