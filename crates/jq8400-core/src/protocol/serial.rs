//! Serial port handling
//!
//! Opening and configuring the port is the application's job; the transaction
//! engine only ever sees the resulting [`SerialLink`](super::SerialLink).

use serialport::SerialPort;
use std::time::Duration;
use tracing::debug;

use super::{link::SerialChannel, ProtocolError, DEFAULT_BAUD_RATE};

/// Open a serial port with default settings
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
    debug!("opening {} at {} baud", name, baud);

    // Reads only happen after bytes_to_read() reports data, so a short
    // timeout is enough
    serialport::new(name, baud)
        .timeout(Duration::from_millis(50))
        .open()
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}

/// Configure a serial port for the module (8N1, no flow control)
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    Ok(())
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}

/// Open, configure and wrap a port in one step
pub fn open_channel(name: &str, baud_rate: Option<u32>) -> Result<SerialChannel, ProtocolError> {
    let mut port = open_port(name, baud_rate)?;
    configure_port(port.as_mut())?;
    clear_buffers(port.as_mut())?;
    Ok(SerialChannel::new(port))
}
