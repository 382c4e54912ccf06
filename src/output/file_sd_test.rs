//! Unit tests for the file_sd writer

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use crate::discovery::{SourceSpec, TargetGroup};
    use crate::output::file_sd::FileSdWriter;

    fn group(namespace: &str, service: &str, addresses: &[&str]) -> TargetGroup {
        let mut group = TargetGroup::for_source(&SourceSpec::new(namespace, service));
        for address in addresses {
            group.push_address(*address);
        }
        group
    }

    fn read_json(writer: &FileSdWriter) -> Value {
        let raw = std::fs::read(writer.path()).unwrap();
        serde_json::from_slice(&raw).unwrap()
    }

    // -------------------------------------------------------------------------
    // apply
    // -------------------------------------------------------------------------

    #[test]
    fn test_upsert_replaces_previous_group() {
        let mut writer = FileSdWriter::new("unused.json");
        writer.apply(vec![group("ns1", "svc1", &["10.0.0.1"])]);
        writer.apply(vec![group("ns1", "svc1", &["10.0.0.2", "10.0.0.3"])]);

        let entries = writer.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].targets, vec!["10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn test_empty_group_removes_source() {
        let mut writer = FileSdWriter::new("unused.json");
        writer.apply(vec![
            group("ns1", "svc1", &["10.0.0.1"]),
            group("ns1", "svc2", &["10.0.0.2"]),
        ]);
        writer.apply(vec![TargetGroup::deletion(&SourceSpec::new("ns1", "svc1"))]);

        let entries = writer.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].labels["__meta_cloudmap_service_name"], "svc2");
    }

    #[test]
    fn test_targets_sorted_and_deduplicated() {
        let mut writer = FileSdWriter::new("unused.json");
        writer.apply(vec![group(
            "ns1",
            "svc1",
            &["10.0.0.9:80", "10.0.0.1:80", "10.0.0.9:80"],
        )]);

        assert_eq!(writer.entries()[0].targets, vec!["10.0.0.1:80", "10.0.0.9:80"]);
    }

    // -------------------------------------------------------------------------
    // flush
    // -------------------------------------------------------------------------

    #[test]
    fn test_flush_writes_file_sd_document() {
        let dir = TempDir::new().unwrap();
        let mut writer = FileSdWriter::new(dir.path().join("cloudmap_sd.json"));
        writer.apply(vec![
            group("ns2", "svc", &["10.0.1.1:9100"]),
            group("ns1", "svc", &["10.0.0.1:9100"]),
        ]);

        assert!(writer.flush().unwrap());

        assert_eq!(
            read_json(&writer),
            json!([
                {
                    "targets": ["10.0.0.1:9100"],
                    "labels": {
                        "__meta_cloudmap_namespace_name": "ns1",
                        "__meta_cloudmap_service_name": "svc"
                    }
                },
                {
                    "targets": ["10.0.1.1:9100"],
                    "labels": {
                        "__meta_cloudmap_namespace_name": "ns2",
                        "__meta_cloudmap_service_name": "svc"
                    }
                }
            ])
        );
    }

    #[test]
    fn test_flush_skips_unchanged_content() {
        let dir = TempDir::new().unwrap();
        let mut writer = FileSdWriter::new(dir.path().join("targets.json"));
        writer.apply(vec![group("ns1", "svc1", &["10.0.0.1"])]);

        assert!(writer.flush().unwrap());
        writer.apply(vec![group("ns1", "svc1", &["10.0.0.1"])]);
        assert!(!writer.flush().unwrap());

        writer.apply(vec![TargetGroup::deletion(&SourceSpec::new("ns1", "svc1"))]);
        assert!(writer.flush().unwrap());
        assert_eq!(read_json(&writer), json!([]));
    }

    #[test]
    fn test_flush_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let mut writer = FileSdWriter::new(dir.path().join("targets.json"));
        writer.apply(vec![group("ns1", "svc1", &["10.0.0.1"])]);
        writer.flush().unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("targets.json")]);
    }

    #[test]
    fn test_flush_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let mut writer = FileSdWriter::new(dir.path().join("missing").join("targets.json"));
        writer.apply(vec![group("ns1", "svc1", &["10.0.0.1"])]);

        assert!(writer.flush().is_err());
    }

    #[tokio::test]
    async fn test_run_consumes_until_sender_closes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("targets.json");
        let (tx, rx) = tokio::sync::mpsc::channel(4);

        tx.send(vec![group("ns1", "svc1", &["10.0.0.1"])]).await.unwrap();
        drop(tx);
        FileSdWriter::new(&path).run(rx).await;

        let written: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written[0]["targets"], json!(["10.0.0.1"]));
    }
}
