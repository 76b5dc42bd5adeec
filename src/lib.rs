#![no_std]

//! A decoder for the serial protocol spoken by the Contec CMS50D+ pulse
//! oximeter.
//!
//! The device streams live samples (pulse waveform, pulse rate, SpO2 and
//! status flags) continuously, and on request dumps the last recorded session
//! as a bulk transfer. Cms50 decodes both.
//!
//! Most users should begin with [`avec::Oximeter`], which owns a serial
//! connection and hands out iterators over live and recorded samples. The
//! codecs, the live frame synchronizer and the bulk transfer finite-state
//! machine are exposed without any I/O in the [`sans`] module, for
//! applications that drive the link themselves.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable stream-based decoders (default).
//! - `serial`: enable the `serialport`-backed stream (default).
//! - `serde`: derive `Serialize` and `Deserialize` for samples.

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
pub mod avec;
pub mod sans;
