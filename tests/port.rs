#![cfg(feature = "serial")]

use std::time::Duration;

use cms50::avec::{Mode, port::PortSettings};
use serialport::{DataBits, FlowControl, Parity, StopBits};

#[test]
fn live_settings() {
    let settings = PortSettings::for_mode(Mode::Live);

    assert_eq!(settings, PortSettings::LIVE);
    assert_eq!(settings.baud_rate, 19200);
    assert_eq!(settings.data_bits, DataBits::Eight);
    assert_eq!(settings.parity, Parity::Odd);
    assert_eq!(settings.stop_bits, StopBits::One);
    assert_eq!(settings.flow_control, FlowControl::None);
    assert_eq!(settings.timeout, Duration::from_secs(1));
}

#[test]
fn bulk_settings() {
    let settings = PortSettings::for_mode(Mode::Bulk);

    assert_eq!(settings, PortSettings::BULK);
    assert_eq!(settings.baud_rate, 19200);
    assert_eq!(settings.data_bits, DataBits::Eight);
    assert_eq!(settings.parity, Parity::Odd);
    assert_eq!(settings.stop_bits, StopBits::One);
    assert_eq!(settings.flow_control, FlowControl::Software);
    assert_eq!(settings.timeout, Duration::from_secs(5));
}
