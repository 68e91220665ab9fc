#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rebody::http::{
        error::BodyError,
        multipart::{
            DEFAULT_SIZE_MAX, DEFAULT_SIZE_THRESHOLD, MultipartConfig, MultipartDispatcher,
            UploadRepository,
        },
        protocol::charset::Charset,
    };
    use tempfile::TempDir;

    const BOUNDARY: &str = "X-REBODY-BOUNDARY";

    enum Part<'a> {
        Text(&'a str, &'a [u8]),
        File(&'a str, &'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part]) -> Bytes {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, data) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
                Part::File(name, file_name, content_type, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            name, file_name, content_type
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Bytes::from(body)
    }

    fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    fn dispatcher(dir: &TempDir) -> MultipartDispatcher {
        let repository = UploadRepository::init(dir.path()).unwrap();
        MultipartDispatcher::new(MultipartConfig::new(repository))
    }

    fn entries(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    // ---------- defaults ----------
    #[test]
    fn test_default_limits() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(&dir);
        assert_eq!(d.config().size_threshold, 64 * 1024);
        assert_eq!(d.config().size_max, 10 * 1024 * 1024);
        assert_eq!(DEFAULT_SIZE_THRESHOLD, 65536);
        assert_eq!(DEFAULT_SIZE_MAX, 10485760);
    }

    // ---------- text + file ----------
    #[tokio::test]
    async fn test_text_and_file_fields() {
        let dir = tempfile::tempdir().unwrap();
        let avatar: &[u8] = &[0x89, b'P', b'N', b'G', 0x00, 0xff];
        let body = multipart_body(&[
            Part::Text("name", b"Alice"),
            Part::File("avatar", "avatar.png", "image/png", avatar),
        ]);

        let params = dispatcher(&dir)
            .dispatch(body, &content_type(), Charset::Utf8)
            .await
            .unwrap();

        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["name", "avatar"]);
        assert_eq!(params.value("name").and_then(|v| v.as_text()), Some("Alice"));

        let file = params.value("avatar").and_then(|v| v.as_file()).unwrap();
        assert_eq!(file.field_name(), "avatar");
        assert_eq!(file.file_name(), "avatar.png");
        assert_eq!(file.content_type(), Some("image/png"));
        assert_eq!(file.size(), avatar.len() as u64);
        assert!(file.is_in_memory());
        assert!(file.path().is_none());
        assert_eq!(file.bytes().await.unwrap().as_ref(), avatar);

        // small parts never touch the repository
        assert_eq!(entries(&dir), 0);
    }

    // ---------- threshold ----------
    #[tokio::test]
    async fn test_part_at_threshold_stays_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![7u8; DEFAULT_SIZE_THRESHOLD];
        let body = multipart_body(&[Part::File("blob", "blob.bin", "application/octet-stream", &data)]);

        let params = dispatcher(&dir)
            .dispatch(body, &content_type(), Charset::Utf8)
            .await
            .unwrap();

        let file = params.value("blob").and_then(|v| v.as_file()).unwrap();
        assert!(file.is_in_memory());
        assert_eq!(file.size(), data.len() as u64);
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_large_part_spills_to_repository() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..DEFAULT_SIZE_THRESHOLD * 2 + 17).map(|i| (i % 251) as u8).collect();
        let body = multipart_body(&[Part::File("blob", "big.bin", "application/octet-stream", &data)]);

        let params = dispatcher(&dir)
            .dispatch(body, &content_type(), Charset::Utf8)
            .await
            .unwrap();

        let file = params.value("blob").and_then(|v| v.as_file()).unwrap().clone();
        assert!(!file.is_in_memory());
        assert!(file.path().unwrap().starts_with(dir.path()));
        assert_eq!(file.size(), data.len() as u64);
        assert_eq!(file.bytes().await.unwrap().as_ref(), data.as_slice());
        assert_eq!(entries(&dir), 1);

        // spill file goes away with the last handle
        drop(params);
        drop(file);
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_spilled_text_field_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let repository = UploadRepository::init(dir.path()).unwrap();
        let d = MultipartDispatcher::new(MultipartConfig::new(repository).with_size_threshold(8));
        let body = multipart_body(&[Part::Text("comment", "a rather long comment, ünïcödé".as_bytes())]);

        let params = d.dispatch(body, &content_type(), Charset::Utf8).await.unwrap();
        assert_eq!(
            params.value("comment").and_then(|v| v.as_text()),
            Some("a rather long comment, ünïcödé")
        );
    }

    // ---------- repeated names ----------
    #[tokio::test]
    async fn test_repeated_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let body = multipart_body(&[
            Part::File("docs", "one.txt", "text/plain", b"first"),
            Part::Text("title", b"report"),
            Part::File("docs", "two.txt", "text/plain", b"second"),
        ]);

        let params = dispatcher(&dir)
            .dispatch(body, &content_type(), Charset::Utf8)
            .await
            .unwrap();

        let names: Vec<String> = params.values("docs").iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["one.txt", "two.txt"]);
        let second = params.values("docs")[1].as_file().unwrap();
        assert_eq!(second.bytes().await.unwrap().as_ref(), b"second");
    }

    // ---------- charset ----------
    #[tokio::test]
    async fn test_text_field_uses_charset() {
        let dir = tempfile::tempdir().unwrap();
        let body = multipart_body(&[Part::Text("drink", &[b'c', b'a', b'f', 0xe9])]);

        let params = dispatcher(&dir)
            .dispatch(body.clone(), &content_type(), Charset::Latin1)
            .await
            .unwrap();
        assert_eq!(params.value("drink").and_then(|v| v.as_text()), Some("café"));

        let err = dispatcher(&dir)
            .dispatch(body, &content_type(), Charset::Utf8)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::Decode(_)));
    }

    // ---------- failures ----------
    #[tokio::test]
    async fn test_size_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let repository = UploadRepository::init(dir.path()).unwrap();
        let d = MultipartDispatcher::new(MultipartConfig::new(repository).with_size_max(128));
        let body = multipart_body(&[Part::File("blob", "b.bin", "application/octet-stream", &[1u8; 256])]);

        let err = d.dispatch(body, &content_type(), Charset::Utf8).await.unwrap_err();
        assert!(matches!(err, BodyError::SizeLimitExceeded { limit: 128 }));
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let err = dispatcher(&dir)
            .dispatch(Bytes::from_static(b"irrelevant"), "multipart/form-data", Charset::Utf8)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::Multipart(_)));
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nunterminated",
            BOUNDARY
        );
        let err = dispatcher(&dir)
            .dispatch(Bytes::from(body), &content_type(), Charset::Utf8)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::Multipart(_)));
    }

    // ---------- repository ----------
    #[test]
    fn test_repository_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let repository = UploadRepository::init(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(repository.path(), nested.as_path());

        // existing directory is fine
        assert!(UploadRepository::init(&nested).is_ok());
    }

    #[test]
    fn test_repository_on_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();

        let err = UploadRepository::init(&file).unwrap_err();
        assert!(matches!(err, BodyError::Storage(_)));
    }
}
