// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::thread;
use std::time::Duration;
use sublines_app::{EXPORT_FILE_NAME, ViewState, build_export, filter_view};
use sublines_data::{DataSource, load_dataset, parse_dataset, write_export};
use sublines_testkit::{
    SINGLE_RUST_JSON, mixed_dataset, write_dataset_file, write_raw_dataset_file,
};
use tiny_http::{Header, Response, Server};

#[test]
fn load_dataset_reads_file_source() -> Result<()> {
    let file = write_dataset_file(&mixed_dataset())?;
    let dataset = load_dataset(&DataSource::File(file.path.clone()), Duration::from_secs(1))?;
    assert_eq!(dataset, mixed_dataset());
    Ok(())
}

#[test]
fn load_dataset_reports_missing_file() {
    let error = load_dataset(
        &DataSource::File("/definitely/not/here/data.json".into()),
        Duration::from_secs(1),
    )
    .expect_err("missing file should fail");
    assert!(format!("{error:#}").contains("read dataset file"));
}

#[test]
fn load_dataset_rejects_malformed_json() -> Result<()> {
    let file = write_raw_dataset_file("{\"eventTypes\": [")?;
    let error = load_dataset(&DataSource::File(file.path.clone()), Duration::from_secs(1))
        .expect_err("malformed JSON should fail");
    let message = format!("{error:#}");
    assert!(message.contains("load dataset from"));
    assert!(message.contains("decode dataset JSON document"));
    Ok(())
}

#[test]
fn parse_dataset_rejects_wrong_field_types() {
    let error = parse_dataset(r#"{"eventTypes":"push","items":[]}"#)
        .expect_err("string eventTypes should fail");
    assert!(error.to_string().contains("decode dataset JSON document"));
}

#[test]
fn load_dataset_fetches_remote_source() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/data.json", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/data.json");
        let response = Response::from_string(SINGLE_RUST_JSON)
            .with_status_code(200)
            .with_header(
                Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header"),
            );
        request.respond(response).expect("response should succeed");
    });

    let dataset = load_dataset(&DataSource::parse(&addr)?, Duration::from_secs(1))?;
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.items()[0].language, "Rust");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn load_dataset_surfaces_http_status() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/data.json", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string("missing").with_status_code(404);
        request.respond(response).expect("response should succeed");
    });

    let error = load_dataset(&DataSource::parse(&addr)?, Duration::from_secs(1))
        .expect_err("404 should fail");
    assert!(error.to_string().contains("returned 404"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn unreachable_remote_source_fails_without_retry() -> Result<()> {
    let error = load_dataset(
        &DataSource::parse("http://127.0.0.1:1/data.json")?,
        Duration::from_millis(200),
    )
    .expect_err("unreachable host should fail");
    assert!(error.to_string().contains("cannot reach"));
    Ok(())
}

#[test]
fn write_export_creates_directory_and_file() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let target = temp.path().join("nested").join("exports");
    let dataset = mixed_dataset();
    let artifact = build_export(&filter_view(&dataset, &ViewState::default()));

    let path = write_export(&target, &artifact)?;
    assert_eq!(path, target.join(EXPORT_FILE_NAME));
    assert_eq!(std::fs::read_to_string(&path)?, artifact.contents);
    Ok(())
}
