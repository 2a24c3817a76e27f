use std::collections::BTreeSet;
use std::fs;

use proptest::prelude::*;
use unitool::{IssueKind, SyncOptions, run, uni};

fn identifier_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("STR_[A-Z][A-Z0-9_]{0,20}").expect("valid identifier regex")
}

/// Distinct identifiers paired with distinct codes.
fn unique_entries_strategy() -> impl Strategy<Value = Vec<(String, u16)>> {
    (
        proptest::collection::btree_set(identifier_strategy(), 0..12),
        proptest::collection::btree_set(0u16..0x2000, 12),
    )
        .prop_map(|(ids, codes)| ids.into_iter().zip(codes).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn unique_definitions_report_no_duplicates(entries in unique_entries_strategy(), split in 0usize..12) {
        let tmp = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let split = split.min(entries.len());
        let (first, second) = entries.split_at(split);
        for (name, part) in [("One.uni", first), ("Two.uni", second)] {
            let text: String = part
                .iter()
                .map(|(id, code)| uni::format_uqi_line(id, "x", *code))
                .collect();
            fs::write(root.join(name), text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }

        let report = run(&SyncOptions::new(tmp.path().join("UqiList.uni")).with_root(&root))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(report.issues_of(IssueKind::DuplicateIdentifier).count(), 0);
        prop_assert_eq!(report.issues_of(IssueKind::DuplicateCode).count(), 0);
        prop_assert_eq!(report.existing_entries, entries.len());
    }

    #[test]
    fn allocated_codes_increase_from_existing_maximum(
        existing in unique_entries_strategy(),
        wanted in proptest::collection::btree_set(identifier_strategy(), 1..8),
    ) {
        let existing_ids: BTreeSet<_> = existing.iter().map(|(id, _)| id.clone()).collect();
        let wanted: Vec<String> = wanted.into_iter().filter(|id| !existing_ids.contains(id)).collect();
        prop_assume!(!wanted.is_empty());

        let tmp = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let target = tmp.path().join("UqiList.uni");

        let existing_text: String = existing
            .iter()
            .map(|(id, code)| uni::format_uqi_line(id, "x", *code))
            .collect();
        fs::write(&target, existing_text).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let form: String = wanted
            .iter()
            .enumerate()
            .map(|(i, id)| format!("oneof varid = Setup.Q{i}, prompt = STRING_TOKEN({id}), endoneof;\n"))
            .collect();
        let strings: String = wanted
            .iter()
            .map(|id| format!("#string {id} #language en-US \"{id}\"\n"))
            .collect();
        fs::write(root.join("Form.vfr"), form).map_err(|e| TestCaseError::fail(e.to_string()))?;
        fs::write(root.join("Strings.uni"), strings).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let report = run(&SyncOptions::new(&target).with_root(&root).with_update(true))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(report.is_success(), "{:?}", report.issues);

        let start = existing.iter().map(|(_, c)| *c + 1).max().unwrap_or(0);
        let codes: Vec<u16> = report.allocated.iter().map(|e| e.code).collect();
        let expected: Vec<u16> = (0..wanted.len() as u16).map(|i| start + i).collect();
        prop_assert_eq!(codes, expected);
        let order: Vec<&str> = report.allocated.iter().map(|e| e.identifier.as_str()).collect();
        let wanted_order: Vec<&str> = wanted.iter().map(String::as_str).collect();
        prop_assert_eq!(order, wanted_order);
    }
}
