mod common;

use std::io::Cursor;

use common::{att_body, flight_log, gps_body, preamble, ATT_TYPE, GPS_TYPE};
use dataflash::builder::DataFlashParserBuilder;
use dataflash::{DataFlashError, DataFlashParser, FieldValue, Message, SliceKey};

type Parser = DataFlashParser<Cursor<Vec<u8>>>;

fn parser() -> Result<Parser, DataFlashError> {
    DataFlashParser::new(Cursor::new(flight_log()))
}

fn read_all(parser: &mut Parser) -> Result<Vec<Message>, DataFlashError> {
    let mut messages = Vec::new();
    while let Some(message) = parser.read_next()? {
        messages.push(message);
    }
    Ok(messages)
}

fn names(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.name.as_str()).collect()
}

fn sequence_numbers(messages: &[Message]) -> Vec<u64> {
    messages.iter().map(|m| m.sequence_number).collect()
}

#[test]
fn test_schema_discovery() -> Result<(), DataFlashError> {
    let parser = parser()?;
    let schemas = parser.schemas();

    assert_eq!(schemas.len(), 4);
    assert_eq!(
        schemas.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        ["FMT", "FMTU", "GPS", "ATT"]
    );

    let gps = schemas.by_name("GPS").unwrap();
    assert_eq!(gps.type_id, GPS_TYPE);
    assert_eq!(gps.record_length, 20);
    assert_eq!(gps.units.as_deref(), Some("s-mD"));
    assert_eq!(gps.mults.as_deref(), Some("F-BG"));

    let att = schemas.get(ATT_TYPE).unwrap();
    assert_eq!(att.format, "Qcc");
    assert!(att.units.is_none());

    // Discovery leaves the cursor at the start.
    assert_eq!(parser.position(), 0);
    Ok(())
}

#[test]
fn test_reads_every_record_in_order() -> Result<(), DataFlashError> {
    let mut parser = parser()?;
    let messages = read_all(&mut parser)?;

    assert_eq!(
        names(&messages),
        ["FMT", "FMT", "FMT", "FMT", "FMTU", "GPS", "ATT", "GPS", "ATT", "GPS"]
    );
    assert_eq!(sequence_numbers(&messages), (1..=10).collect::<Vec<_>>());

    let gps = &messages[5];
    assert_eq!(gps.time_micros, 1_000_000);
    assert_eq!(gps.field("Status"), Some(&FieldValue::U8(3)));
    assert_eq!(gps.field("Alt"), Some(&FieldValue::I32(1234)));
    assert!(matches!(gps.field("Lat"), Some(FieldValue::Scaled(lat)) if (lat - 37.748_736).abs() < 1e-9));

    let att = &messages[6];
    assert_eq!(att.time_micros, 1_100_000);
    assert_eq!(att.field("Roll"), Some(&FieldValue::Scaled(-10.0)));
    assert_eq!(att.field("Pitch"), Some(&FieldValue::Scaled(2.5)));

    // The FMT records describe themselves.
    let fmt = &messages[2];
    assert_eq!(fmt.field("Name"), Some(&FieldValue::Str("GPS".into())));
    assert_eq!(fmt.field("Columns"), Some(&FieldValue::Str("TimeUS,Status,Alt,Lat".into())));
    assert_eq!(fmt.time_micros, 0);

    // Exhausted until rewound.
    assert!(parser.read_next()?.is_none());
    assert!(parser.read_next()?.is_none());
    Ok(())
}

#[test]
fn test_iterator() -> Result<(), DataFlashError> {
    let parser = parser()?;

    let gps_times = parser
        .filter_map(Result::ok)
        .filter(|m| m.name == "GPS")
        .map(|m| m.time_micros)
        .collect::<Vec<_>>();

    assert_eq!(gps_times, [1_000_000, 2_000_000, 3_000_000]);
    Ok(())
}

#[test]
fn test_rewind_restarts_sequence() -> Result<(), DataFlashError> {
    let mut parser = parser()?;
    let first = read_all(&mut parser)?;

    parser.rewind()?;
    assert_eq!(parser.position(), 0);
    let second = read_all(&mut parser)?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_filter_keeps_unfiltered_sequence_numbers() -> Result<(), DataFlashError> {
    let mut parser = parser()?;
    parser.set_filter(["GPS"])?;

    let messages = read_all(&mut parser)?;
    assert_eq!(names(&messages), ["GPS", "GPS", "GPS"]);
    assert_eq!(sequence_numbers(&messages), [6, 8, 10]);
    Ok(())
}

#[test]
fn test_set_filter_rewinds() -> Result<(), DataFlashError> {
    let mut parser = parser()?;
    read_all(&mut parser)?;

    parser.set_filter(vec!["ATT".to_string()])?;
    let messages = read_all(&mut parser)?;
    assert_eq!(sequence_numbers(&messages), [7, 9]);

    // Setting the same filter again starts over again.
    parser.set_filter(["ATT"])?;
    assert_eq!(parser.read_next()?.map(|m| m.sequence_number), Some(7));
    Ok(())
}

#[test]
fn test_filter_with_some_unknown_names() -> Result<(), DataFlashError> {
    let mut parser = parser()?;
    parser.set_filter(["ATT", "XKF1", "BARO"])?;

    assert_eq!(names(&read_all(&mut parser)?), ["ATT", "ATT"]);
    Ok(())
}

#[test]
fn test_filter_with_only_unknown_names() -> Result<(), DataFlashError> {
    let mut parser = parser()?;
    parser.set_filter(["GPS"])?;
    parser.read_next()?;

    let result = parser.set_filter(["XKF1", "BARO"]);
    assert!(matches!(
        result,
        Err(DataFlashError::InvalidFilter(ref names)) if names == &["XKF1", "BARO"]
    ));

    // The previous filter and position survive a rejected filter.
    assert_eq!(parser.read_next()?.map(|m| m.sequence_number), Some(8));
    Ok(())
}

#[test]
fn test_clear_filter_keeps_position() -> Result<(), DataFlashError> {
    let mut parser = parser()?;
    parser.set_filter(["GPS"])?;

    assert_eq!(parser.read_next()?.map(|m| m.sequence_number), Some(6));
    assert_eq!(parser.read_next()?.map(|m| m.sequence_number), Some(8));

    parser.clear_filter();

    let next = parser.read_next()?.unwrap();
    assert_eq!(next.name, "ATT");
    assert_eq!(next.sequence_number, 9);
    Ok(())
}

#[test]
fn test_slice_by_sequence() -> Result<(), DataFlashError> {
    let mut parser = parser()?;

    let slice = parser.get_slice(6, 9, SliceKey::Sequence)?;
    assert_eq!(names(&slice), ["GPS", "ATT", "GPS"]);
    assert_eq!(sequence_numbers(&slice), [6, 7, 8]);

    // The scan stops at the first message reaching the end of the range.
    assert_eq!(parser.read_next()?.map(|m| m.sequence_number), Some(10));
    Ok(())
}

#[test]
fn test_slice_by_time() -> Result<(), DataFlashError> {
    let mut parser = parser()?;

    let slice = parser.get_slice(1_000_000, 2_100_000, SliceKey::TimeMicros)?;
    assert_eq!(names(&slice), ["GPS", "ATT", "GPS"]);

    let all_gps = {
        parser.set_filter(["GPS"])?;
        parser.get_slice(0, i64::MAX, SliceKey::TimeMicros)?
    };
    assert_eq!(all_gps.len(), 3);

    let empty = parser.get_slice(5_000_000, 6_000_000, SliceKey::TimeMicros)?;
    assert!(empty.is_empty());
    Ok(())
}

#[test]
fn test_slice_past_end_of_stream() -> Result<(), DataFlashError> {
    let mut parser = parser()?;

    let slice = parser.get_slice(9, 100, SliceKey::Sequence)?;
    assert_eq!(sequence_numbers(&slice), [9, 10]);
    Ok(())
}

#[test]
fn test_signed_time_is_kept() -> Result<(), DataFlashError> {
    let log = common::LogBuilder::new()
        .fmt(140, "EV", "qB", "TimeUS,Id")
        .record(140, &common::Body::new().i64(-5).u8(1).build())
        .record(140, &common::Body::new().i64(20).u8(2).build())
        .build();

    let mut parser = DataFlashParser::new(Cursor::new(log))?;

    let slice = parser.get_slice(-10, 0, SliceKey::TimeMicros)?;
    assert_eq!(slice.len(), 1);
    assert_eq!(slice[0].time_micros, -5);
    assert_eq!(slice[0].field("Id"), Some(&FieldValue::U8(1)));
    Ok(())
}

#[test]
fn test_builder_applies_filter() -> Result<(), DataFlashError> {
    let mut parser = DataFlashParserBuilder::new(Cursor::new(flight_log()))
        .message_filter(["ATT"])
        .build()?;

    assert_eq!(names(&read_all(&mut parser)?), ["ATT", "ATT"]);

    let rejected = DataFlashParserBuilder::new(Cursor::new(flight_log()))
        .message_filter(["NOPE"])
        .build();
    assert!(matches!(rejected, Err(DataFlashError::InvalidFilter(_))));
    Ok(())
}

#[test]
fn test_close_returns_source() -> Result<(), DataFlashError> {
    let log = flight_log();
    let len = log.len();

    let mut parser = DataFlashParser::new(Cursor::new(log))?;
    parser.read_next()?;

    let source = parser.close();
    assert_eq!(source.into_inner().len(), len);
    Ok(())
}

#[test]
fn test_empty_source() -> Result<(), DataFlashError> {
    let mut parser = DataFlashParser::new(Cursor::new(Vec::new()))?;

    assert!(parser.schemas().is_empty());
    assert!(parser.read_next()?.is_none());
    Ok(())
}

#[test]
fn test_data_before_definitions_is_decoded() -> Result<(), DataFlashError> {
    // A GPS record logged before the FMT that declares it.
    let log = common::LogBuilder::new()
        .record(GPS_TYPE, &gps_body(10, 1, 2, 3))
        .fmt(GPS_TYPE, "GPS", "QBiL", "TimeUS,Status,Alt,Lat")
        .record(ATT_TYPE, &att_body(20, 0, 0))
        .build();

    let mut parser = DataFlashParser::new(Cursor::new(log))?;
    let first = parser.read_next()?.unwrap();
    assert_eq!(first.name, "GPS");
    assert_eq!(first.time_micros, 10);
    assert_eq!(first.sequence_number, 1);

    // FMT is not self-described here, and ATT is never declared: both are skipped.
    assert!(parser.read_next()?.is_none());
    Ok(())
}

#[test]
fn test_overlay_before_definition() -> Result<(), DataFlashError> {
    let log = common::LogBuilder::new()
        .fmtu_definition()
        .fmtu(1, ATT_TYPE, "sdd", "FBB")
        .fmt(ATT_TYPE, "ATT", "Qcc", "TimeUS,Roll,Pitch")
        .build();

    let parser = DataFlashParser::new(Cursor::new(log))?;
    let att = parser.schemas().by_name("ATT").unwrap();
    assert_eq!(att.units.as_deref(), Some("sdd"));
    assert_eq!(att.mults.as_deref(), Some("FBB"));
    Ok(())
}

#[test]
fn test_duplicate_names_resolve_to_lowest_type_id() -> Result<(), DataFlashError> {
    let log = preamble()
        .fmt(140, "GPS", "Q", "TimeUS")
        .record(140, &common::Body::new().u64(5).build())
        .record(GPS_TYPE, &gps_body(6, 1, 2, 3))
        .build();

    let mut parser = DataFlashParser::new(Cursor::new(log))?;
    parser.set_filter(["GPS"])?;

    let messages = read_all(&mut parser)?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].type_id, GPS_TYPE);
    Ok(())
}
