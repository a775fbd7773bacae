mod support;

use std::io::Cursor;

use csv::ReaderBuilder;
use freehub::{
    DecodeOptions, Value,
    avec::{self, Document, FromRecords, reader, slice},
    profile::ProfileTables,
    sans::{Fields, check::compute_crc, header::DocumentHeaderError},
};
use support::Builder;

const TIMESTAMP: u32 = 1_000_000_000;

/// A short ride: a file id, a full record, a compressed record, and a stop
/// event.
fn activity() -> Vec<u8> {
    let mut file_id = vec![4];
    file_id.extend(1u16.to_le_bytes());
    file_id.extend(TIMESTAMP.to_le_bytes());

    let mut record = TIMESTAMP.to_le_bytes().to_vec();
    record.push(120);
    record.extend(5000u16.to_le_bytes());
    record.push(20);

    let mut compressed = vec![125];
    compressed.extend(5500u16.to_le_bytes());

    let mut event = (TIMESTAMP + 30).to_le_bytes().to_vec();
    event.extend([0, 4]);

    Builder::new()
        .definition(0, 0, &[(0, 1, 0x00), (1, 2, 0x84), (4, 4, 0x86)])
        .data(0, &file_id)
        .definition(1, 20, &[(253, 4, 0x86), (3, 1, 0x02), (6, 2, 0x84), (13, 1, 0x01)])
        .data(1, &record)
        .definition(2, 20, &[(3, 1, 0x02), (6, 2, 0x84)])
        .compressed(2, 30, &compressed)
        .definition(3, 21, &[(253, 4, 0x86), (0, 1, 0x00), (1, 1, 0x00)])
        .data(3, &event)
        .document()
}

const ACTIVITY: &str = "\
file_id,manufacturer=garmin,time_created=2021-09-08T01:46:40+00:00,type=activity
record,enhanced_speed=5,heart_rate=120,speed=5,temperature=20,timestamp=2021-09-08T01:46:40+00:00
record,enhanced_speed=5.5,heart_rate=125,speed=5.5,timestamp=2021-09-08T01:47:10+00:00
event,event=timer,event_type=stop_all,timestamp=2021-09-08T01:47:10+00:00
";

#[test]
fn decode_slice_activity() {
    let data = activity();
    let document =
        Document::from_slice(&data, &ProfileTables::standard(), &DecodeOptions::default()).unwrap();

    validate(&document, ACTIVITY);
    assert!(document.checksum.unwrap().is_valid());
    document.verify().unwrap();
}

#[test]
fn decode_reader_activity() {
    let mut r = Cursor::new(activity());
    let document =
        Document::from_reader(&mut r, &ProfileTables::standard(), &DecodeOptions::default())
            .unwrap();

    validate(&document, ACTIVITY);
    assert_eq!(r.position() as usize, r.get_ref().len());
}

#[test]
fn decode_reader_chained_documents() {
    let profile = ProfileTables::standard();
    let options = DecodeOptions::default();

    let mut data = activity();
    data.extend(activity());
    let mut r = Cursor::new(data);

    for _ in 0..2 {
        let document = Document::from_reader(&mut r, &profile, &options).unwrap();
        validate(&document, ACTIVITY);
    }

    assert!(matches!(
        Document::from_reader(&mut r, &profile, &options),
        Err(reader::Error::Io(_))
    ));
}

#[test]
fn summarize_document() {
    struct Names(Vec<String>);

    impl FromRecords for Names {
        fn add_record(&mut self, name: &str, _: Fields) {
            self.0.push(name.to_string());
        }
    }

    let data = activity();
    let mut names = Names(vec![]);
    let summary = avec::decode_slice(
        &data,
        &ProfileTables::standard(),
        &DecodeOptions::default(),
        &mut names,
    )
    .unwrap();

    assert_eq!(names.0, ["file_id", "record", "record", "event"]);
    assert_eq!(summary.header.header_size, 14);
    assert_eq!(summary.header.protocol_version, 0x20);
    assert_eq!(summary.header.profile_version, 2132);
    assert_eq!(summary.header.data_size as usize, data.len() - 16);
    assert!(summary.header.checksum.is_some());
    assert!(summary.checksum.is_valid());
}

#[test]
fn reject_checksum_mismatch() {
    let mut data = activity();
    let last = data.len() - 1;
    data[last] ^= 0xFF;

    let profile = ProfileTables::standard();
    let options = DecodeOptions {
        force: false,
        ..DecodeOptions::default()
    };

    assert!(matches!(
        Document::from_slice(&data, &profile, &options),
        Err(slice::Error::CyclicRedundancyCheck { .. })
    ));
    assert!(matches!(
        Document::from_reader(&mut Cursor::new(&data), &profile, &options),
        Err(reader::Error::Decode(slice::Error::CyclicRedundancyCheck { .. }))
    ));
}

#[test]
fn force_checksum_mismatch() {
    let mut data = activity();
    let last = data.len() - 1;
    data[last] ^= 0xFF;

    let document =
        Document::from_slice(&data, &ProfileTables::standard(), &DecodeOptions::default()).unwrap();

    validate(&document, ACTIVITY);

    let checksum = document.checksum.unwrap();
    assert!(!checksum.is_valid());
    assert_eq!(checksum.found ^ 0xFF00, checksum.calculated);
    assert!(matches!(
        document.verify(),
        Err(slice::Error::CyclicRedundancyCheck { .. })
    ));
}

#[test]
fn reject_incorrect_headers() {
    let profile = ProfileTables::standard();
    let options = DecodeOptions::default();

    let mut data = activity();
    data[8] = b'X';
    assert!(matches!(
        Document::from_slice(&data, &profile, &options),
        Err(slice::Error::Header(DocumentHeaderError::NotFitData))
    ));
    assert!(matches!(
        Document::from_reader(&mut Cursor::new(&data), &profile, &options),
        Err(reader::Error::Decode(slice::Error::Header(
            DocumentHeaderError::NotFitData
        )))
    ));

    let mut data = activity();
    data[12] ^= 0xFF;
    assert!(matches!(
        Document::from_slice(&data, &profile, &options),
        Err(slice::Error::Header(
            DocumentHeaderError::CyclicRedundancyCheck { .. }
        ))
    ));

    let mut data = activity();
    data[0] = 13;
    assert!(matches!(
        Document::from_slice(&data, &profile, &options),
        Err(slice::Error::Header(DocumentHeaderError::UnknownHeaderLength(13)))
    ));

    assert!(matches!(
        Document::from_slice(&data[..8], &profile, &options),
        Err(slice::Error::Header(DocumentHeaderError::Truncated))
    ));
}

#[test]
fn reject_truncated_document() {
    let profile = ProfileTables::standard();
    let options = DecodeOptions::default();

    let data = activity();
    let data = &data[..data.len() - 3];

    assert!(matches!(
        Document::from_slice(data, &profile, &options),
        Err(slice::Error::EndOfSlice)
    ));
    assert!(matches!(
        Document::from_reader(&mut Cursor::new(data), &profile, &options),
        Err(reader::Error::Io(_))
    ));
}

#[test]
fn reject_oversized_data_size() {
    let profile = ProfileTables::standard();
    let options = DecodeOptions::default();

    let mut data = activity();
    data[4..8].copy_from_slice(&0xF000_0000u32.to_le_bytes());
    let crc = compute_crc(0, &data[..12]);
    data[12..14].copy_from_slice(&crc.to_le_bytes());

    assert!(matches!(
        Document::from_slice(&data, &profile, &options),
        Err(slice::Error::EndOfSlice)
    ));
    assert!(matches!(
        Document::from_reader(&mut Cursor::new(&data), &profile, &options),
        Err(reader::Error::Io(_))
    ));
}

#[test]
fn decode_with_json_options() {
    let options: DecodeOptions = serde_json::from_str(
        r#"{"speed_unit": "km/h", "temperature_unit": "fahrenheit", "elapsed_record_field": true}"#,
    )
    .unwrap();
    assert!(options.force);

    let data = activity();
    let document = Document::from_slice(&data, &ProfileTables::standard(), &options).unwrap();

    let records: Vec<_> = document.messages("record").collect();
    assert_eq!(records.len(), 2);

    let float = |fields: &Fields, name: &str| fields[name].as_f64().unwrap();

    assert!((float(&records[0].fields, "speed") - 18.0).abs() < 1e-9);
    assert_eq!(records[0].fields["enhanced_speed"], Value::Float(5.0));
    assert!((float(&records[0].fields, "temperature") - 68.0).abs() < 1e-9);
    assert!((float(&records[1].fields, "speed") - 19.8).abs() < 1e-9);

    assert_eq!(records[0].fields["elapsed_time"], Value::Float(0.0));
    assert_eq!(records[1].fields["elapsed_time"], Value::Float(30.0));

    // Other messages are untouched.
    assert!(!document.messages("event").any(|m| m.fields.contains_key("elapsed_time")));
}

#[test]
fn serialize_document() {
    let data = activity();
    let document =
        Document::from_slice(&data, &ProfileTables::standard(), &DecodeOptions::default()).unwrap();

    let json = serde_json::to_value(&document).unwrap();

    assert_eq!(json["messages"][0]["name"], "file_id");
    assert_eq!(json["messages"][0]["fields"]["manufacturer"], "garmin");
    assert_eq!(json["messages"][1]["fields"]["heart_rate"], 120);
    assert_eq!(json["messages"][2]["fields"]["speed"], 5.5);
    assert_eq!(json["checksum"]["found"], json["checksum"]["calculated"]);
}

/// Compare decoded messages against expected lines of a message name
/// followed by `field=value` cells in field order.
fn validate(document: &Document, expected: &str) {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(expected.as_bytes());

    let expected: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
        .collect();

    assert_eq!(document.messages.len(), expected.len());

    for (message, expected) in document.messages.iter().zip(expected) {
        let mut found = vec![message.name.clone()];
        found.extend(
            message
                .fields
                .iter()
                .map(|(name, value)| format!("{name}={}", render(value))),
        );

        assert_eq!(found, expected);
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Integer(x) => x.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Text(s) | Value::Label(s) => s.clone(),
        Value::Timestamp(t) => t.to_rfc3339(),
        Value::Balance { left, right } => format!("{left}/{right}"),
    }
}
