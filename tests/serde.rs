#![cfg(feature = "serde")]

use chrono::{NaiveDate, NaiveDateTime};
use cms50::sans::{LiveSample, RecordedSample};
use csv::WriterBuilder;

fn time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 3, 1)
        .and_then(|d| d.and_hms_opt(22, 30, 0))
        .unwrap()
}

fn write<T: serde::Serialize>(records: &[T]) -> String {
    let mut writer = WriterBuilder::new().from_writer(vec![]);
    for record in records {
        writer.serialize(record).unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

#[test]
fn live_csv_columns() {
    let sample = LiveSample::decode(time(), [0xC7, 0x30, 0x05, 0x48, 0x62]).unwrap();
    let csv = write(&[sample]);
    let mut lines = csv.lines();

    assert_eq!(
        lines.next(),
        Some(
            "Time,PulseRate,SpO2,PulseWaveform,BarGraph,SignalStrength,Beep,FingerOut,\
             Searching,DroppingSpO2,ProbeError"
        )
    );
    assert_eq!(
        lines.next(),
        Some("2015-03-01T22:30:00,72,98,48,5,7,true,false,false,false,false")
    );
}

#[test]
fn recorded_csv_round_trip() {
    let samples = [
        RecordedSample::decode(time(), [0xF0, 0xC8, 0x60]).unwrap(),
        RecordedSample::decode(time(), [0xF1, 0x82, 0x61]).unwrap(),
    ];
    let csv = write(&samples);

    assert!(csv.starts_with("Time,PulseRate,SpO2\n"));

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let decoded: Vec<RecordedSample> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(decoded, samples);
}
