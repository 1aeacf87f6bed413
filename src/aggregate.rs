use std::collections::BTreeMap;

use crate::model::PodRecord;
use crate::status::{StatusClass, is_failed, is_running};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NamespaceSummary {
    pub name: String,
    pub total: usize,
    pub running: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NamespaceGroup<'a> {
    pub summary: NamespaceSummary,
    pub members: Vec<&'a PodRecord>,
}

impl NamespaceGroup<'_> {
    pub fn name(&self) -> &str {
        &self.summary.name
    }

    pub fn worst_status(&self) -> Option<StatusClass> {
        self.members
            .iter()
            .map(|pod| StatusClass::classify(&pod.status))
            .min_by_key(|class| class.rank())
    }
}

pub fn aggregate(records: &[PodRecord]) -> Vec<NamespaceGroup<'_>> {
    let mut grouped = BTreeMap::<&str, Vec<&PodRecord>>::new();
    for pod in records {
        grouped.entry(pod.namespace.as_str()).or_default().push(pod);
    }

    grouped
        .into_iter()
        .map(|(namespace, mut members)| {
            members.sort_by(|left, right| left.name.cmp(&right.name));
            let running = members.iter().filter(|pod| is_running(&pod.status)).count();
            let failed = members.iter().filter(|pod| is_failed(&pod.status)).count();
            NamespaceGroup {
                summary: NamespaceSummary {
                    name: namespace.to_string(),
                    total: members.len(),
                    running,
                    failed,
                },
                members,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{NamespaceSummary, aggregate};
    use crate::model::{PodRecord, pod};
    use crate::status::StatusClass;

    fn member_names<'a>(records: &'a [PodRecord], namespace: &str) -> Vec<&'a str> {
        aggregate(records)
            .into_iter()
            .find(|group| group.name() == namespace)
            .map(|group| {
                group
                    .members
                    .into_iter()
                    .map(|pod| pod.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn groups_and_counts_by_namespace() {
        let records = vec![
            pod("a", "ns1", "Running"),
            pod("b", "ns1", "Failed"),
            pod("c", "ns2", "Pending"),
        ];

        let groups = aggregate(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0].summary,
            NamespaceSummary {
                name: "ns1".to_string(),
                total: 2,
                running: 1,
                failed: 1,
            }
        );
        assert_eq!(
            groups[1].summary,
            NamespaceSummary {
                name: "ns2".to_string(),
                total: 1,
                running: 0,
                failed: 0,
            }
        );
        assert_eq!(member_names(&records, "ns1"), vec!["a", "b"]);
        assert_eq!(member_names(&records, "ns2"), vec!["c"]);
    }

    #[test]
    fn ordering_ignores_input_permutation() {
        let forward = vec![pod("x", "b", "Running"), pod("y", "a", "Running")];
        let reversed = vec![pod("y", "a", "Running"), pod("x", "b", "Running")];

        let names = |records: &[PodRecord]| {
            aggregate(records)
                .iter()
                .map(|group| group.name().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&forward), vec!["a", "b"]);
        assert_eq!(names(&reversed), vec!["a", "b"]);
    }

    #[test]
    fn members_sorted_by_name() {
        let records = vec![
            pod("web-2", "shop", "Running"),
            pod("api-0", "shop", "Running"),
            pod("web-10", "shop", "Running"),
        ];
        assert_eq!(
            member_names(&records, "shop"),
            vec!["api-0", "web-10", "web-2"]
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = vec![
            pod("q", "zeta", "Unknown"),
            pod("p", "alpha", "CrashLoopBackOff"),
            pod("o", "alpha", "running"),
            pod("n", "mid", "Succeeded"),
        ];
        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn totals_cover_every_record() {
        let records = vec![
            pod("a", "one", "Running"),
            pod("b", "two", ""),
            pod("c", "two", "Evicted"),
            pod("d", "three", "Error"),
        ];
        let total = aggregate(&records)
            .iter()
            .map(|group| group.summary.total)
            .sum::<usize>();
        assert_eq!(total, records.len());
    }

    #[test]
    fn namespace_keys_are_case_sensitive() {
        let records = vec![pod("a", "Prod", "Running"), pod("b", "prod", "Running")];
        let groups = aggregate(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name(), "Prod");
        assert_eq!(groups[1].name(), "prod");
    }

    #[test]
    fn unknown_statuses_count_only_toward_total() {
        let records = vec![pod("a", "ns", "Evicted"), pod("b", "ns", "")];
        let groups = aggregate(&records);
        assert_eq!(groups[0].summary.total, 2);
        assert_eq!(groups[0].summary.running, 0);
        assert_eq!(groups[0].summary.failed, 0);
    }

    #[test]
    fn worst_status_prefers_failures() {
        let records = vec![
            pod("a", "ns", "Running"),
            pod("b", "ns", "ImagePullBackOff"),
            pod("c", "ns", "Pending"),
        ];
        let groups = aggregate(&records);
        assert_eq!(groups[0].worst_status(), Some(StatusClass::Failed));
        assert!(aggregate(&[]).is_empty());
    }
}
