//! End-to-end tests: bytes in, converted bytes and report out.
//!
//! Fixtures live in `testdata/`.

use dataset_tool::config::AppSettings;
use dataset_tool::error::{DatasetError, Result};
use dataset_tool::frame::{self, Cell};
use dataset_tool::io::{self, DecodeOptions, Format};
use dataset_tool::pipeline::{Anomaly, PipelineOptions, Stage};
use dataset_tool::service::process_upload;
use polars::prelude::*;

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(format!("testdata/{name}")).expect("fixture exists")
}

fn as_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).expect("UTF-8 output")
}

#[test]
fn test_normalize_and_fill_constant() -> Result<()> {
    let options = PipelineOptions::from_json(
        r#"{"normalize_column_names": true,
            "missing_policy": {"method": "fill_constant", "value": "unknown"}}"#,
    )?;
    let out = process_upload(
        b"First Name,age!\nAlice,30\nbob,\n",
        "people.csv",
        &options,
        &AppSettings::default(),
    )?;

    assert_eq!(as_text(&out.bytes), "First_Name,Age\nAlice,30\nbob,unknown\n");
    assert_eq!(out.filename, "converted_people.csv");
    assert_eq!(out.media_type(), "text/csv");
    Ok(())
}

#[test]
fn test_cleaning_fixture() -> Result<()> {
    let options = PipelineOptions::from_json(
        r#"{"normalize_column_names": true,
            "trim_cell_whitespace": true,
            "missing_policy": {"method": "fill_const", "value": "unknown"},
            "remove_duplicates": true}"#,
    )?;
    let out = process_upload(
        &fixture("people.csv"),
        "people.csv",
        &options,
        &AppSettings::default(),
    )?;

    assert_eq!(
        as_text(&out.bytes),
        "First_Name,Age,City\nAlice,30,Oslo\nbob,unknown,Lima\nCarol,41,unknown\n"
    );
    let report = &out.report;
    assert_eq!((report.rows_before, report.rows_after), (4, 3));
    let stages: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::NormalizeNames,
            Stage::TrimWhitespace,
            Stage::MissingValues,
            Stage::Deduplicate
        ]
    );
    assert_eq!(report.stages[3].rows_dropped(), 1);
    // " Oslo " twice
    assert_eq!(report.stages[1].cells_changed, Some(2));
    assert!(report.to_json()?.contains(r#""cells_changed": 2"#));
    Ok(())
}

#[test]
fn test_split_and_flatten_fixture() -> Result<()> {
    let options = PipelineOptions::from_file("testdata/contacts_options.json")?;
    let out = process_upload(
        &fixture("contacts.csv"),
        "contacts.csv",
        &options,
        &AppSettings::default(),
    )?;

    assert_eq!(
        as_text(&out.bytes),
        "Id,First,Last,Meta.city,Meta.geo.lat\n\
         1,Jane,Doe,Oslo,59.9\n\
         2,Madonna,,Lima,\n\
         3,Mary,Ann Evans,,\n"
    );

    let anomalies: Vec<_> = out.report.anomalies().collect();
    assert_eq!(anomalies.len(), 2);
    assert_eq!(
        anomalies[0],
        (
            Stage::SplitColumn,
            &Anomaly::ShortSplit {
                column: "Full_Name".to_owned(),
                rows: 1
            }
        )
    );
    assert!(matches!(
        anomalies[1],
        (Stage::FlattenNested, Anomaly::UnparseableCell { column, row: 2, .. }) if column == "Meta"
    ));

    // split and flatten keep the row count
    assert!(out.report.stages.iter().all(|s| s.rows_dropped() == 0));
    Ok(())
}

#[test]
fn test_single_byte_fallback() -> Result<()> {
    let out = process_upload(
        &fixture("latin1.csv"),
        "latin1.csv",
        &PipelineOptions::default(),
        &AppSettings::default(),
    )?;
    assert_eq!(as_text(&out.bytes), "word,count\ncafé,2\nnaïve,3\n");
    Ok(())
}

#[test]
fn test_unknown_fallback_encoding_is_rejected() {
    let settings = AppSettings {
        fallback_encoding: "not-an-encoding".to_owned(),
        ..Default::default()
    };
    let err = process_upload(
        b"a\n1\n",
        "a.csv",
        &PipelineOptions::default(),
        &settings,
    )
    .unwrap_err();
    assert!(matches!(
        &err,
        DatasetError::Configuration { field, .. } if field == "fallback_encoding"
    ));
}

#[test]
fn test_workbook_round_trip() -> Result<()> {
    let table = df! {
        "Full Name" => &["Jane Doe", "Jane Doe", "Ann Lee"],
        "score" => &[Some(1.5), Some(1.5), None],
    }?;
    let upload = io::encode(&table, Format::Xlsx)?;
    let options = PipelineOptions::from_json(
        r#"{"normalize_column_names": true,
            "remove_duplicates": true,
            "missing_policy": {"method": "fill_mean"}}"#,
    )?;

    let out = process_upload(&upload, "Scores.XLSX", &options, &AppSettings::default())?;
    assert_eq!(out.filename, "converted_Scores.xlsx");
    assert_eq!(out.format, Format::Xlsx);

    let result = io::decode(&out.bytes, Format::Xlsx, &DecodeOptions::default())?;
    assert_eq!(frame::column_names(&result), vec!["Full_Name", "Score"]);
    assert_eq!(result.height(), 2);
    assert_eq!(
        frame::cells(result.column("Full_Name")?)?,
        vec![Cell::from("Jane Doe"), Cell::from("Ann Lee")]
    );
    assert_eq!(
        frame::cells(result.column("Score")?)?,
        vec![Cell::Float(1.5), Cell::Float(1.5)]
    );
    Ok(())
}

#[test]
fn test_untouched_values_are_written_back_verbatim() -> Result<()> {
    let input = "id,zip,ratio,age
                 9007199254740993,007,1.10,30
                 1,abc,2.0, 41
";
    let out = process_upload(
        input.as_bytes(),
        "ids.csv",
        &PipelineOptions::default(),
        &AppSettings::default(),
    )?;
    assert_eq!(as_text(&out.bytes), input);
    Ok(())
}

#[test]
fn test_large_integers_survive_a_transform() -> Result<()> {
    let options = PipelineOptions::from_json(r#"{"remove_duplicates": true}"#)?;
    let out = process_upload(
        b"id
9007199254740993
9007199254740992
9007199254740993
",
        "ids.csv",
        &options,
        &AppSettings::default(),
    )?;
    assert_eq!(
        as_text(&out.bytes),
        "id
9007199254740993
9007199254740992
"
    );
    Ok(())
}

#[test]
fn test_duplicate_csv_headers_are_suffixed() -> Result<()> {
    let out = process_upload(
        b"id,id,id
1,2,3
",
        "dupes.csv",
        &PipelineOptions::default(),
        &AppSettings::default(),
    )?;
    assert_eq!(as_text(&out.bytes), "id,id_2,id_3
1,2,3
");
    Ok(())
}

#[test]
fn test_unsupported_extension() {
    let err = process_upload(
        b"{}",
        "data.json",
        &PipelineOptions::default(),
        &AppSettings::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), "configuration_error");
    assert!(err.is_client_error());
}

#[test]
fn test_bad_reference_fails_before_transforming() {
    let options = PipelineOptions::from_json(
        r#"{"remove_duplicates": true,
            "join_columns": {"source_columns": ["First Name", "Surname"],
                             "separator": " ", "new_column": "Name"}}"#,
    )
    .expect("valid options");
    let err = process_upload(
        &fixture("people.csv"),
        "people.csv",
        &options,
        &AppSettings::default(),
    )
    .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::JoinColumns));
    assert!(err.to_string().contains("'Surname' not found"));
}

#[test]
fn test_unknown_option_is_rejected() {
    let err = PipelineOptions::from_json(r#"{"normalise_column_names": true}"#).unwrap_err();
    assert_eq!(err.kind(), "configuration_error");
}

#[test]
fn test_malformed_csv_is_decode_error() {
    let err = process_upload(
        b"a,b\n1,2,3,4\n",
        "bad.csv",
        &PipelineOptions::default(),
        &AppSettings::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), "decode_error");
}
