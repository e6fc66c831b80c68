use std::cmp::Ordering;
use std::collections::HashMap;

use crate::record::ImageRecord;

/// All records of one SeriesInstanceUID, in display order.
#[derive(Debug, Clone)]
pub struct SeriesGroup {
    series_instance_uid: String,
    label: String,
    records: Vec<ImageRecord>,
}

impl SeriesGroup {
    pub fn series_instance_uid(&self) -> &str {
        &self.series_instance_uid
    }

    /// Modality and description, or the series UID when both are missing
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn label_for(series_instance_uid: &str, first: &ImageRecord) -> String {
        let parts: Vec<&str> = [first.modality(), first.series_description()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            series_instance_uid.to_string()
        } else {
            parts.join(" ")
        }
    }
}

pub struct SeriesGrouper;

impl SeriesGrouper {
    /// Partition records by SeriesInstanceUID.
    ///
    /// Groups come out in first-seen order of their UID. Within a group,
    /// records are ordered by instance number, then slice position, then
    /// input order. Records without a value sort after those with one.
    pub fn group(records: Vec<ImageRecord>) -> Vec<SeriesGroup> {
        let mut index_of: HashMap<String, usize> = HashMap::new();
        let mut partitions: Vec<(String, Vec<ImageRecord>)> = Vec::new();

        for record in records {
            let uid = record.series_instance_uid().to_string();
            match index_of.get(&uid) {
                Some(&index) => partitions[index].1.push(record),
                None => {
                    index_of.insert(uid.clone(), partitions.len());
                    partitions.push((uid, vec![record]));
                }
            }
        }

        partitions
            .into_iter()
            .map(|(series_instance_uid, mut records)| {
                Self::sort_records(&mut records);
                let label = SeriesGroup::label_for(&series_instance_uid, &records[0]);
                SeriesGroup {
                    series_instance_uid,
                    label,
                    records,
                }
            })
            .collect()
    }

    fn sort_records(records: &mut [ImageRecord]) {
        // sort_by is stable; the source index makes the order total anyway
        records.sort_by(|a, b| {
            Self::compare_missing_last(a.instance_number(), b.instance_number(), i32::cmp)
                .then_with(|| {
                    Self::compare_missing_last(a.slice_position(), b.slice_position(), f64::total_cmp)
                })
                .then_with(|| a.source().index.cmp(&b.source().index))
        });
    }

    fn compare_missing_last<T>(
        a: Option<T>,
        b: Option<T>,
        cmp: impl Fn(&T, &T) -> Ordering,
    ) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => cmp(&a, &b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}
