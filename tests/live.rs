#![cfg(feature = "std")]

mod mock;

use cms50::avec::{LiveSamples, Mode, Oximeter};
use mock::{Event, MockStream};

const FRAMES: [u8; 15] = [
    0x80 | 0x40 | 7, 0x30, 0x05, 0x48, 0x62, // 72 bpm, 98%
    0x80 | 7, 0x31, 0x45, 0x02, 0x61, // 130 bpm, 97%
    0x80 | 6, 0x32, 0x05, 0x46, 0x60, // 70 bpm, 96%
];

#[test]
fn decodes_until_timeout() {
    let mut stream = MockStream::new(&FRAMES);
    stream.push_timeout().push(&FRAMES);

    let samples: Vec<_> = LiveSamples::new(&mut stream).collect();

    let rates: Vec<_> = samples.iter().map(|s| (s.pulse_rate, s.spo2)).collect();
    assert_eq!(rates, [(72, 98), (130, 97), (70, 96)]);
    assert!(samples[0].beep);
    assert_eq!(samples[0].signal_strength, 7);
    assert_eq!(samples[1].bar_graph, 5);

    assert_eq!(stream.events, [Event::Open(Mode::Live), Event::Close]);
    assert_eq!(stream.unread(), FRAMES.len());
}

#[test]
fn realigns_when_joining_mid_stream() {
    let mut stream = MockStream::new(&FRAMES[2..]);

    let samples: Vec<_> = LiveSamples::new(&mut stream).collect();

    let rates: Vec<_> = samples.iter().map(|s| s.pulse_rate).collect();
    assert_eq!(rates, [130, 70]);
}

#[test]
fn io_failure_ends_stream() {
    let mut stream = MockStream::new(&FRAMES[..10]);
    stream.push(&[0x80, 1, 2]).push_failure().push(&FRAMES);

    let mut samples = LiveSamples::new(&mut stream);
    assert_eq!(samples.next().map(|s| s.pulse_rate), Some(72));
    assert_eq!(samples.next().map(|s| s.pulse_rate), Some(130));
    assert_eq!(samples.next(), None);
    assert!(samples.is_finished());
    assert_eq!(samples.next(), None);
    drop(samples);

    assert_eq!(stream.events, [Event::Open(Mode::Live), Event::Close]);
}

#[test]
fn dropping_closes_stream() {
    let mut oximeter = Oximeter::new(MockStream::new(&FRAMES));

    let first = oximeter.live().next();
    assert_eq!(first.map(|s| s.spo2), Some(98));

    let stream = oximeter.into_inner();
    assert!(!stream.open);
    assert_eq!(stream.events, [Event::Open(Mode::Live), Event::Close]);
}

#[test]
fn unopenable_stream_is_empty() {
    let mut stream = MockStream::new(&FRAMES);
    stream.refuse_open = true;

    assert_eq!(LiveSamples::new(&mut stream).count(), 0);
    assert!(stream.events.is_empty());
}

#[test]
fn samples_are_stamped_in_order() {
    let mut stream = MockStream::new(&FRAMES);

    let times: Vec<_> = LiveSamples::new(&mut stream).map(|s| s.time).collect();

    assert_eq!(times.len(), 3);
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}
