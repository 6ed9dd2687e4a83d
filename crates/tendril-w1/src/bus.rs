//! Bus access seam: enumeration and raw record reads

use std::io;
use std::path::PathBuf;
use tendril_core::DeviceId;

/// A device discovered on the bus during one polling cycle
///
/// Created fresh by every enumeration and discarded at cycle end; nothing
/// is cached across cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusDevice {
    pub id: DeviceId,
    /// Raw data source backing this device
    pub data_path: PathBuf,
}

/// Access to the 1-Wire bus
///
/// Both operations fail soft: enumeration drops devices whose id cannot be
/// resolved, and `read_raw` errors are treated by callers as transient,
/// retried naturally on the next cycle.
pub trait W1Bus {
    /// List devices currently present on the bus, ordered by discovery path
    fn enumerate(&self) -> Vec<BusDevice>;

    /// Read the raw text lines of a device's data file
    fn read_raw(&self, device: &BusDevice) -> io::Result<Vec<String>>;
}
