//! Instance merger (spec.md §4.6, component 6).
//!
//! Groups loaded instance records by `$id`, preserving first-seen order,
//! and instance-merges every record sharing an id in load order. A `$class`
//! mismatch within a group is fatal. Reuses [`Instance::to_value`] /
//! [`Instance::from_merged_value`] so the generic [`crate::merge::instance_merge`]
//! does the actual combining - no bespoke instance-merge logic lives here.

use crate::core::StrukturError;
use crate::merge::instance_merge;
use crate::model::Instance;
use std::collections::HashMap;

/// Summary counters for one merge pass, surfaced in build output.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeStats {
    /// Total instance records loaded, before grouping.
    pub total_records: usize,
    /// Number of distinct `$id`s seen.
    pub unique_ids: usize,
    /// Number of ids that had more than one contributing record.
    pub merged_groups: usize,
}

/// Group `records` by `$id` and merge each group into one [`Instance`].
pub fn merge_instances(records: Vec<Instance>) -> Result<(Vec<Instance>, MergeStats), StrukturError> {
    let total_records = records.len();

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Instance>> = HashMap::new();
    for record in records {
        groups.entry(record.id.clone()).or_insert_with(|| {
            order.push(record.id.clone());
            Vec::new()
        }).push(record);
    }

    let merged_groups = groups.values().filter(|g| g.len() > 1).count();
    let unique_ids = order.len();

    let mut merged = Vec::with_capacity(order.len());
    for id in order {
        let group = groups.remove(&id).expect("id came from this group map");
        merged.push(merge_group(&id, group)?);
    }

    Ok((merged, MergeStats { total_records, unique_ids, merged_groups }))
}

/// Fold one `$id`'s records into a single [`Instance`].
fn merge_group(id: &str, group: Vec<Instance>) -> Result<Instance, StrukturError> {
    let mut records = group.into_iter();
    let first = records.next().expect("groups are never empty");

    let mut class = first.class.clone();
    let mut source_files = first.source_files.clone();
    let mut value = first.to_value();

    for next in records {
        if next.class != class {
            return Err(StrukturError::ClassMismatch {
                id: id.to_string(),
                first: class.clone(),
                second: next.class.clone(),
            });
        }
        source_files.extend(next.source_files.iter().cloned());
        value = instance_merge(&value, &next.to_value())?;
        class = next.class;
    }

    Ok(Instance::from_merged_value(value, source_files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn instance(id: &str, class: &str, extra: serde_json::Value, file: &str) -> Instance {
        Instance::new(
            id.to_string(),
            class.to_string(),
            extra.as_object().cloned().unwrap_or_default(),
            PathBuf::from(file),
        )
    }

    #[test]
    fn single_record_groups_pass_through() {
        let records = vec![instance("a", "server", json!({"cpu": 2}), "a.json")];
        let (merged, stats) = merge_instances(records).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.merged_groups, 0);
    }

    #[test]
    fn merges_records_sharing_an_id_in_load_order() {
        let records = vec![
            instance("a", "server", json!({"cpu": 2}), "base.json"),
            instance("a", "server", json!({"mem": 8}), "override.json"),
        ];
        let (merged, stats) = merge_instances(records).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(stats.merged_groups, 1);
        assert_eq!(merged[0].extra.get("cpu"), Some(&json!(2)));
        assert_eq!(merged[0].extra.get("mem"), Some(&json!(8)));
        assert_eq!(merged[0].source_files, vec![PathBuf::from("base.json"), PathBuf::from("override.json")]);
    }

    #[test]
    fn rejects_class_mismatch_within_a_group() {
        let records = vec![
            instance("a", "server", json!({}), "base.json"),
            instance("a", "workstation", json!({}), "override.json"),
        ];
        let err = merge_instances(records).unwrap_err();
        assert!(matches!(err, StrukturError::ClassMismatch { .. }));
    }

    #[test]
    fn preserves_first_seen_order_across_ids() {
        let records = vec![
            instance("b", "server", json!({}), "b.json"),
            instance("a", "server", json!({}), "a.json"),
        ];
        let (merged, _) = merge_instances(records).unwrap();
        assert_eq!(merged[0].id, "b");
        assert_eq!(merged[1].id, "a");
    }
}
